//! Effort observations and calendar-day boundaries.
//!
//! # Responsibility
//! - Define the timestamped "remaining effort" record owned by a card.
//! - Map instants to calendar days in the single reference zone.
//!
//! # Invariants
//! - `remaining` is never negative (enforced by the unsigned type).
//! - Day keys are zero-padded `YYYY-MM-DD`, so string order is day order.

use crate::model::card::CardId;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable observation identifier.
pub type ObservationId = Uuid;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
const SECONDS_PER_MINUTE: i32 = 60;
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// One "remaining effort" reading for a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffortObservation {
    pub uuid: ObservationId,
    pub card_uuid: CardId,
    /// Instant the reading applies to. Kept when the day is overwritten.
    pub recorded_at: DateTime<Utc>,
    pub remaining: u32,
}

impl EffortObservation {
    /// Creates a new observation with a generated id.
    pub fn new(card_uuid: CardId, recorded_at: DateTime<Utc>, remaining: u32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            card_uuid,
            recorded_at,
            remaining,
        }
    }
}

/// Fixed UTC offset that defines midnight-to-midnight day boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone(FixedOffset);

impl ReferenceZone {
    /// UTC day boundaries.
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    /// Builds a zone `minutes` east of UTC.
    ///
    /// Returns `None` outside `-1439..=1439`.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return None;
        }
        FixedOffset::east_opt(minutes * SECONDS_PER_MINUTE).map(Self)
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }

    /// Calendar day `at` falls on in this zone.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.0).date_naive()
    }

    /// Whether both instants fall on the same calendar day.
    pub fn same_day(&self, left: DateTime<Utc>, right: DateTime<Utc>) -> bool {
        self.day_of(left) == self.day_of(right)
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::utc()
    }
}

/// Formats a day as `YYYY-MM-DD`.
pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` day key.
pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_KEY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_of_respects_reference_offset() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        let utc = ReferenceZone::utc();
        let cet = ReferenceZone::from_offset_minutes(60).unwrap();
        let pst = ReferenceZone::from_offset_minutes(-8 * 60).unwrap();

        assert_eq!(day_key(utc.day_of(at)), "2024-03-10");
        assert_eq!(day_key(cet.day_of(at)), "2024-03-11");
        assert_eq!(day_key(pst.day_of(at)), "2024-03-10");
    }

    #[test]
    fn same_day_is_midnight_to_midnight() {
        let zone = ReferenceZone::utc();
        let morning = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        assert!(zone.same_day(morning, night));
        assert!(!zone.same_day(night, next));
    }

    #[test]
    fn offset_outside_one_day_is_rejected() {
        assert!(ReferenceZone::from_offset_minutes(24 * 60).is_none());
        assert!(ReferenceZone::from_offset_minutes(-24 * 60).is_none());
        assert!(ReferenceZone::from_offset_minutes(-1439).is_some());
    }

    #[test]
    fn day_keys_sort_chronologically() {
        let early = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(day_key(early) < day_key(late));
        assert_eq!(parse_day_key("2024-01-02"), Some(late));
        assert_eq!(parse_day_key("2024-1-2x"), None);
    }
}
