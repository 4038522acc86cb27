//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the persistence collaborator consumed by services.
//! - Keep SQL and transaction boundaries inside this layer.
//!
//! # Invariants
//! - Structural card mutations run in one `IMMEDIATE` transaction.
//! - Repositories refuse connections whose schema is not fully migrated.
//! - Read paths reject corrupt rows (`InvalidData`) instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::card::{BoardId, CardId, ColumnId};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod board_repo;
pub mod card_repo;
pub mod effort_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    BoardNotFound(BoardId),
    ColumnNotFound(ColumnId),
    CardNotFound(CardId),
    /// Card has no column, so it cannot be reordered or removed.
    CardUnplaced(CardId),
    /// Card already sits in a column and cannot be inserted again.
    CardAlreadyPlaced(CardId),
    /// Target column belongs to a different board than the card.
    CrossBoardPlacement {
        card_uuid: CardId,
        column_uuid: ColumnId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::CardUnplaced(id) => write!(f, "card is not placed in a column: {id}"),
            Self::CardAlreadyPlaced(id) => write!(f, "card is already placed in a column: {id}"),
            Self::CrossBoardPlacement {
                card_uuid,
                column_uuid,
            } => write!(
                f,
                "card {card_uuid} cannot be placed in column {column_uuid} of another board"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Table and columns a repository depends on.
pub(crate) struct RequiredTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Verifies schema version and required tables/columns.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[RequiredTable],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        let present = table_columns(conn, table.name)?;
        if let Some(column) = table
            .columns
            .iter()
            .find(|column| !present.iter().any(|name| name.as_str() == **column))
        {
            return Err(RepoError::MissingRequiredColumn {
                table: table.name,
                column: *column,
            });
        }
    }

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_position(value: i64, column: &'static str) -> RepoResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|position| *position >= 1)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid position `{value}` in {column}")))
}

pub(crate) fn parse_epoch_ms(value: i64, column: &'static str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
