//! Effort history and burndown series for one card.
//!
//! # Responsibility
//! - Keep a per-day index of a card's effort observations.
//! - Apply same-day overwrite semantics for new readings.
//! - Derive the current remaining effort and the gap-filled daily series.
//!
//! # Invariants
//! - At most one observation per calendar day of the reference zone.
//! - An overwrite changes `remaining` only; the stored instant is kept.
//! - "Current" is always the latest observation by instant, regardless of
//!   insertion order.
//! - The series is a step function: forward-fill, no interpolation.

use crate::model::card::CardId;
use crate::model::effort::{day_key, EffortObservation, ReferenceZone};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// How a reading landed in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No observation existed for that day; a new one was appended.
    Inserted(EffortObservation),
    /// The day's observation was overwritten in place.
    Overwritten {
        observation: EffortObservation,
        previous_remaining: u32,
    },
}

impl RecordOutcome {
    /// Observation as stored after the write.
    pub fn observation(&self) -> &EffortObservation {
        match self {
            Self::Inserted(observation) => observation,
            Self::Overwritten { observation, .. } => observation,
        }
    }

    pub fn is_overwrite(&self) -> bool {
        matches!(self, Self::Overwritten { .. })
    }
}

/// Daily remaining-effort series keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Burndown {
    days: BTreeMap<String, u32>,
}

impl Burndown {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Value for a `YYYY-MM-DD` key.
    pub fn get(&self, key: &str) -> Option<u32> {
        self.days.get(key).copied()
    }

    /// Value for a calendar day.
    pub fn on(&self, day: NaiveDate) -> Option<u32> {
        self.get(&day_key(day))
    }

    /// `(day key, remaining)` pairs in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.days.iter().map(|(day, value)| (day.as_str(), *value))
    }

    /// Remaining values in chronological order.
    pub fn values(&self) -> Vec<u32> {
        self.days.values().copied().collect()
    }

    pub fn first_day(&self) -> Option<&str> {
        self.days.keys().next().map(String::as_str)
    }

    pub fn last_day(&self) -> Option<&str> {
        self.days.keys().next_back().map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, u32> {
        self.days
    }

    fn put(&mut self, day: NaiveDate, remaining: u32) {
        self.days.insert(day_key(day), remaining);
    }
}

/// Effort observations of one card, indexed by calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffortHistory {
    card_uuid: CardId,
    zone: ReferenceZone,
    by_day: BTreeMap<NaiveDate, EffortObservation>,
}

impl EffortHistory {
    /// Creates an empty history.
    pub fn new(card_uuid: CardId, zone: ReferenceZone) -> Self {
        Self {
            card_uuid,
            zone,
            by_day: BTreeMap::new(),
        }
    }

    /// Indexes observations in any order.
    ///
    /// If two observations fall on the same day (for example rows written
    /// under a different zone), the later instant wins that day.
    pub fn from_observations(
        card_uuid: CardId,
        zone: ReferenceZone,
        observations: impl IntoIterator<Item = EffortObservation>,
    ) -> Self {
        let mut sorted = observations.into_iter().collect::<Vec<_>>();
        sorted.sort_by_key(|observation| observation.recorded_at);

        let mut history = Self::new(card_uuid, zone);
        for observation in sorted {
            let day = zone.day_of(observation.recorded_at);
            history.by_day.insert(day, observation);
        }
        history
    }

    pub fn card_uuid(&self) -> CardId {
        self.card_uuid
    }

    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    pub fn len(&self) -> usize {
        self.by_day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }

    /// Observations in ascending instant order.
    pub fn observations(&self) -> impl Iterator<Item = &EffortObservation> + '_ {
        self.by_day.values()
    }

    /// Direct day lookup.
    pub fn on_day(&self, day: NaiveDate) -> Option<&EffortObservation> {
        self.by_day.get(&day)
    }

    /// Records `remaining` at `at`, overwriting that day's reading if any.
    pub fn record(&mut self, remaining: u32, at: DateTime<Utc>) -> RecordOutcome {
        let day = self.zone.day_of(at);
        match self.by_day.entry(day) {
            Entry::Occupied(mut slot) => {
                let observation = slot.get_mut();
                let previous_remaining = observation.remaining;
                observation.remaining = remaining;
                RecordOutcome::Overwritten {
                    observation: observation.clone(),
                    previous_remaining,
                }
            }
            Entry::Vacant(slot) => {
                let observation = EffortObservation::new(self.card_uuid, at, remaining);
                slot.insert(observation.clone());
                RecordOutcome::Inserted(observation)
            }
        }
    }

    /// Latest observation by instant.
    pub fn latest(&self) -> Option<&EffortObservation> {
        self.by_day
            .values()
            .max_by_key(|observation| observation.recorded_at)
    }

    /// Remaining effort of the latest observation, or 0 without any.
    pub fn current_remaining(&self) -> u32 {
        self.latest().map_or(0, |observation| observation.remaining)
    }

    /// Instant of the latest observation.
    pub fn last_recorded_at(&self) -> Option<DateTime<Utc>> {
        self.latest().map(|observation| observation.recorded_at)
    }

    /// Builds the daily series from the first observed day through
    /// `max(last observed day, horizon day)`.
    ///
    /// Gaps between observations repeat the earlier value. After the last
    /// observation the value is carried to the horizon day unless it is 0.
    pub fn burndown(&self, horizon: DateTime<Utc>) -> Burndown {
        let mut series = Burndown::default();
        let mut cursor: Option<(NaiveDate, u32)> = None;

        for (day, observation) in &self.by_day {
            if let Some((previous_day, previous_value)) = cursor {
                fill_forward(&mut series, previous_day, *day, previous_value);
            }
            series.put(*day, observation.remaining);
            cursor = Some((*day, observation.remaining));
        }

        if let Some((last_day, last_value)) = cursor {
            let horizon_day = self.zone.day_of(horizon);
            if last_value > 0 && last_day < horizon_day {
                fill_forward(&mut series, last_day, horizon_day, last_value);
                series.put(horizon_day, last_value);
            }
        }

        series
    }
}

/// Fills every day strictly between `after` and `before` with `value`.
fn fill_forward(series: &mut Burndown, after: NaiveDate, before: NaiveDate, value: u32) {
    let mut day = after;
    while let Some(next) = day.succ_opt() {
        if next >= before {
            break;
        }
        series.put(next, value);
        day = next;
    }
}
