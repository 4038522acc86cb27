//! Remaining-effort use-case service.
//!
//! # Responsibility
//! - Record remaining-effort readings, at most one per card per day.
//! - Produce current values and day-by-day burndown series.
//!
//! # Invariants
//! - Days are resolved in the service's fixed reference zone.
//! - Recording again on an already-observed day overwrites the value and
//!   keeps the original instant.

use crate::burndown::{Burndown, EffortHistory, RecordOutcome};
use crate::config::CoreConfig;
use crate::model::card::{Card, CardId};
use crate::model::effort::ReferenceZone;
use crate::model::view::CardView;
use crate::notify::{CardChange, CardChangeKind};
use crate::repo::effort_repo::EffortRepository;
use crate::repo::RepoError;
use chrono::{DateTime, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from effort service operations.
#[derive(Debug)]
pub enum EffortServiceError {
    /// Remaining effort must fit a non-negative 32-bit count.
    InvalidRemaining(i64),
    CardNotFound(CardId),
    Repo(RepoError),
}

impl Display for EffortServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRemaining(value) => {
                write!(f, "remaining effort must be non-negative, got {value}")
            }
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EffortServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EffortServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CardNotFound(id) => Self::CardNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// State of a card's effort right after a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffortSnapshot {
    pub card_uuid: CardId,
    pub outcome: RecordOutcome,
    pub current_remaining: u32,
    pub last_recorded_at: Option<DateTime<Utc>>,
}

impl EffortSnapshot {
    /// Change event for the recorded card.
    pub fn change(&self, card: &Card) -> CardChange {
        CardChange::new(CardChangeKind::UpdateCardHours, card, card.placement())
    }
}

/// Effort service facade.
pub struct EffortService<R: EffortRepository> {
    repo: R,
    zone: ReferenceZone,
}

impl<R: EffortRepository> EffortService<R> {
    /// Creates a service resolving days in UTC.
    pub fn new(repo: R) -> Self {
        Self::with_zone(repo, ReferenceZone::utc())
    }

    pub fn with_zone(repo: R, zone: ReferenceZone) -> Self {
        Self { repo, zone }
    }

    pub fn with_config(repo: R, config: &CoreConfig) -> Self {
        Self::with_zone(repo, config.reference_zone())
    }

    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// Records `remaining` for the card at instant `at`.
    pub fn record(
        &self,
        card_uuid: CardId,
        remaining: i64,
        at: DateTime<Utc>,
    ) -> Result<EffortSnapshot, EffortServiceError> {
        let remaining =
            u32::try_from(remaining).map_err(|_| EffortServiceError::InvalidRemaining(remaining))?;
        let day = self.zone.day_of(at);
        let outcome = self.repo.record_for_day(card_uuid, day, at, remaining)?;

        let latest = self.repo.latest_observation(card_uuid)?;
        let snapshot = EffortSnapshot {
            card_uuid,
            current_remaining: latest.as_ref().map_or(0, |o| o.remaining),
            last_recorded_at: latest.map(|o| o.recorded_at),
            outcome,
        };

        let mode = if snapshot.outcome.is_overwrite() {
            "overwrite"
        } else {
            "insert"
        };
        info!(
            "event=effort_record module=effort status=ok card_uuid={card_uuid} day={day} mode={mode} remaining={remaining}"
        );
        Ok(snapshot)
    }

    /// Records `remaining` at the current instant.
    pub fn record_now(
        &self,
        card_uuid: CardId,
        remaining: i64,
    ) -> Result<EffortSnapshot, EffortServiceError> {
        self.record(card_uuid, remaining, Utc::now())
    }

    /// Remaining effort of the latest observation; 0 when none exist.
    pub fn current_remaining(&self, card_uuid: CardId) -> Result<u32, EffortServiceError> {
        self.ensure_card(card_uuid)?;
        Ok(self
            .repo
            .latest_observation(card_uuid)?
            .map_or(0, |observation| observation.remaining))
    }

    pub fn last_recorded_at(
        &self,
        card_uuid: CardId,
    ) -> Result<Option<DateTime<Utc>>, EffortServiceError> {
        self.ensure_card(card_uuid)?;
        Ok(self
            .repo
            .latest_observation(card_uuid)?
            .map(|observation| observation.recorded_at))
    }

    /// Loads the full observation history of a card.
    pub fn history(&self, card_uuid: CardId) -> Result<EffortHistory, EffortServiceError> {
        self.ensure_card(card_uuid)?;
        let observations = self.repo.list_observations(card_uuid)?;
        Ok(EffortHistory::from_observations(
            card_uuid,
            self.zone,
            observations,
        ))
    }

    /// Day-by-day burndown through the day of `horizon`.
    pub fn burndown(
        &self,
        card_uuid: CardId,
        horizon: DateTime<Utc>,
    ) -> Result<Burndown, EffortServiceError> {
        let series = self.history(card_uuid)?.burndown(horizon);
        info!(
            "event=effort_burndown module=effort status=ok card_uuid={card_uuid} days={}",
            series.len()
        );
        Ok(series)
    }

    pub fn burndown_now(&self, card_uuid: CardId) -> Result<Burndown, EffortServiceError> {
        self.burndown(card_uuid, Utc::now())
    }

    /// External projection of a card including its current effort.
    pub fn card_view(&self, card: &Card) -> Result<CardView, EffortServiceError> {
        let latest = self.repo.latest_observation(card.uuid)?;
        Ok(CardView::new(
            card,
            latest.as_ref().map_or(0, |o| o.remaining),
            latest.map(|o| o.recorded_at),
        ))
    }

    fn ensure_card(&self, card_uuid: CardId) -> Result<(), EffortServiceError> {
        if self.repo.card_exists(card_uuid)? {
            Ok(())
        } else {
            Err(EffortServiceError::CardNotFound(card_uuid))
        }
    }
}
