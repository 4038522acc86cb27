//! Core domain logic for the taskboard.
//! This crate is the single source of truth for card ordering and
//! remaining-effort invariants.

pub mod burndown;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod ordering;
pub mod repo;
pub mod service;

pub use burndown::{Burndown, EffortHistory, RecordOutcome};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogLevel, LogSettings,
};
pub use model::card::{
    Board, BoardId, Card, CardColor, CardId, CardPlacement, CardValidationError, Column, ColumnId,
    NewCard,
};
pub use model::effort::{EffortObservation, ReferenceZone};
pub use model::view::CardView;
pub use notify::{CardChange, CardChangeKind, ChangeNotifier, NotifyError};
pub use ordering::{OrderedColumn, OrderingError};
pub use repo::board_repo::{BoardRepository, SqliteBoardRepository};
pub use repo::card_repo::{CardRepository, SqliteCardRepository};
pub use repo::effort_repo::{EffortRepository, SqliteEffortRepository};
pub use repo::{RepoError, RepoResult};
pub use service::board_service::{BoardService, BoardServiceError};
pub use service::card_service::{CardMove, CardService, CardServiceError};
pub use service::effort_service::{EffortService, EffortServiceError, EffortSnapshot};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
