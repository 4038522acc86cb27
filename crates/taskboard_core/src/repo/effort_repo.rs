//! Effort observation repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist effort observations keyed by `(card, reference-zone day)`.
//! - Provide direct day lookup instead of scanning a card's history.
//!
//! # Invariants
//! - `(card_uuid, day_key)` is unique; a second reading for a day
//!   overwrites `remaining` and keeps `recorded_at`.
//! - Observation listing is ascending by `recorded_at`.

use crate::burndown::RecordOutcome;
use crate::model::card::CardId;
use crate::model::effort::{day_key, EffortObservation};
use crate::repo::{
    ensure_connection_ready, parse_epoch_ms, parse_uuid, RepoError, RepoResult, RequiredTable,
};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const OBSERVATION_SELECT_SQL: &str = "SELECT
    uuid,
    card_uuid,
    recorded_at,
    remaining
FROM effort_observations";

const REQUIRED_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "effort_observations",
        columns: &["uuid", "card_uuid", "day_key", "recorded_at", "remaining"],
    },
    RequiredTable {
        name: "cards",
        columns: &["uuid"],
    },
];

/// Repository interface for a card's effort observations.
pub trait EffortRepository {
    fn card_exists(&self, card_uuid: CardId) -> RepoResult<bool>;
    /// All observations of a card, oldest first.
    fn list_observations(&self, card_uuid: CardId) -> RepoResult<Vec<EffortObservation>>;
    /// The observation stored for `day`, if any.
    fn find_for_day(
        &self,
        card_uuid: CardId,
        day: NaiveDate,
    ) -> RepoResult<Option<EffortObservation>>;
    /// Latest observation by `recorded_at`.
    fn latest_observation(&self, card_uuid: CardId) -> RepoResult<Option<EffortObservation>>;
    /// Overwrites the reading for `day` or appends a new one at `at`.
    fn record_for_day(
        &self,
        card_uuid: CardId,
        day: NaiveDate,
        at: DateTime<Utc>,
        remaining: u32,
    ) -> RepoResult<RecordOutcome>;
}

/// SQLite-backed effort repository.
pub struct SqliteEffortRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEffortRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl EffortRepository for SqliteEffortRepository<'_> {
    fn card_exists(&self, card_uuid: CardId) -> RepoResult<bool> {
        card_exists(self.conn, card_uuid)
    }

    fn list_observations(&self, card_uuid: CardId) -> RepoResult<Vec<EffortObservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OBSERVATION_SELECT_SQL}
             WHERE card_uuid = ?1
             ORDER BY recorded_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([card_uuid.to_string()])?;
        let mut observations = Vec::new();
        while let Some(row) = rows.next()? {
            observations.push(parse_observation_row(row)?);
        }
        Ok(observations)
    }

    fn find_for_day(
        &self,
        card_uuid: CardId,
        day: NaiveDate,
    ) -> RepoResult<Option<EffortObservation>> {
        find_for_day(self.conn, card_uuid, day)
    }

    fn latest_observation(&self, card_uuid: CardId) -> RepoResult<Option<EffortObservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OBSERVATION_SELECT_SQL}
             WHERE card_uuid = ?1
             ORDER BY recorded_at DESC, uuid DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([card_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_observation_row(row)?));
        }
        Ok(None)
    }

    fn record_for_day(
        &self,
        card_uuid: CardId,
        day: NaiveDate,
        at: DateTime<Utc>,
        remaining: u32,
    ) -> RepoResult<RecordOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !card_exists(&tx, card_uuid)? {
            return Err(RepoError::CardNotFound(card_uuid));
        }

        let outcome = match find_for_day(&tx, card_uuid, day)? {
            Some(existing) => {
                tx.execute(
                    "UPDATE effort_observations
                     SET remaining = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    params![existing.uuid.to_string(), i64::from(remaining)],
                )?;
                let previous_remaining = existing.remaining;
                RecordOutcome::Overwritten {
                    observation: EffortObservation {
                        remaining,
                        ..existing
                    },
                    previous_remaining,
                }
            }
            None => {
                // Storage keeps millisecond precision.
                let observation =
                    EffortObservation::new(card_uuid, at.trunc_subsecs(3), remaining);
                tx.execute(
                    "INSERT INTO effort_observations (
                        uuid,
                        card_uuid,
                        day_key,
                        recorded_at,
                        remaining
                    ) VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        observation.uuid.to_string(),
                        card_uuid.to_string(),
                        day_key(day),
                        observation.recorded_at.timestamp_millis(),
                        i64::from(remaining),
                    ],
                )?;
                RecordOutcome::Inserted(observation)
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}

fn card_exists(conn: &Connection, card_uuid: CardId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cards WHERE uuid = ?1);",
        [card_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn find_for_day(
    conn: &Connection,
    card_uuid: CardId,
    day: NaiveDate,
) -> RepoResult<Option<EffortObservation>> {
    let mut stmt = conn.prepare(&format!(
        "{OBSERVATION_SELECT_SQL}
         WHERE card_uuid = ?1
           AND day_key = ?2;"
    ))?;
    let mut rows = stmt.query(params![card_uuid.to_string(), day_key(day)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_observation_row(row)?));
    }
    Ok(None)
}

fn parse_observation_row(row: &Row<'_>) -> RepoResult<EffortObservation> {
    let uuid: String = row.get("uuid")?;
    let card_uuid: String = row.get("card_uuid")?;
    let remaining: i64 = row.get("remaining")?;
    let remaining = u32::try_from(remaining).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid remaining `{remaining}` in effort_observations.remaining"
        ))
    })?;

    Ok(EffortObservation {
        uuid: parse_uuid(&uuid, "effort_observations.uuid")?,
        card_uuid: parse_uuid(&card_uuid, "effort_observations.card_uuid")?,
        recorded_at: parse_epoch_ms(row.get("recorded_at")?, "effort_observations.recorded_at")?,
        remaining,
    })
}
