//! Card ordering use-case service.
//!
//! # Responsibility
//! - Expose insert / move_within / move_across / remove over the card
//!   repository, plus card creation and field edits.
//! - Report every structural mutation as a [`CardMove`] (before/after).
//!
//! # Invariants
//! - Positions are clamped: `[1, count + 1]` for inserts, `[1, count]` for
//!   moves within a column.
//! - A failed precondition (unplaced card, foreign column) changes nothing.

use crate::config::CoreConfig;
use crate::model::card::{
    normalize_display_name, normalize_optional, normalize_tags, BoardId, Card, CardColor,
    CardId, CardPlacement, CardValidationError, ColumnId, NewCard, DEFAULT_CARD_NAME,
};
use crate::notify::{CardChange, CardChangeKind};
use crate::repo::card_repo::CardRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Position a quickly-added card lands on.
const ADD_NEW_POSITION: i64 = 1;

/// Errors from card service operations.
#[derive(Debug)]
pub enum CardServiceError {
    /// Display name is blank after trim.
    InvalidDisplayName,
    /// Color is not in `#rrggbb` form.
    InvalidColor(String),
    ColumnNotFound(ColumnId),
    CardNotFound(CardId),
    /// Card is not in any column.
    CardUnplaced(CardId),
    /// Card is already in a column; use a move instead.
    CardAlreadyPlaced(CardId),
    /// Column belongs to a different board.
    ColumnNotOnBoard {
        column_uuid: ColumnId,
        board_uuid: BoardId,
    },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for CardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDisplayName => write!(f, "display name must not be blank"),
            Self::InvalidColor(value) => {
                write!(f, "invalid card color `{value}`; expected #rrggbb")
            }
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::CardUnplaced(id) => write!(f, "card is not placed in a column: {id}"),
            Self::CardAlreadyPlaced(id) => write!(f, "card is already placed in a column: {id}"),
            Self::ColumnNotOnBoard {
                column_uuid,
                board_uuid,
            } => write!(f, "column {column_uuid} does not belong to board {board_uuid}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CardServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ColumnNotFound(id) => Self::ColumnNotFound(id),
            RepoError::CardNotFound(id) => Self::CardNotFound(id),
            RepoError::CardUnplaced(id) => Self::CardUnplaced(id),
            RepoError::CardAlreadyPlaced(id) => Self::CardAlreadyPlaced(id),
            other => Self::Repo(other),
        }
    }
}

impl From<CardValidationError> for CardServiceError {
    fn from(value: CardValidationError) -> Self {
        match value {
            CardValidationError::BlankName => Self::InvalidDisplayName,
            CardValidationError::InvalidColor(value) => Self::InvalidColor(value),
        }
    }
}

/// Result of a structural card mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMove {
    /// Card state after the mutation.
    pub card: Card,
    /// Placement before the mutation.
    pub before: Option<CardPlacement>,
}

impl CardMove {
    /// Placement after the mutation.
    pub fn after(&self) -> Option<CardPlacement> {
        self.card.placement()
    }

    /// Builds the change event a caller publishes for this mutation.
    pub fn change(&self, kind: CardChangeKind) -> CardChange {
        CardChange::new(kind, &self.card, self.before)
    }
}

/// Card ordering service facade.
pub struct CardService<R: CardRepository> {
    repo: R,
    default_card_name: String,
}

impl<R: CardRepository> CardService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            default_card_name: DEFAULT_CARD_NAME.to_string(),
        }
    }

    /// Creates a service using config defaults.
    pub fn with_config(repo: R, config: &CoreConfig) -> Self {
        Self {
            repo,
            default_card_name: config.default_card_name.trim().to_string(),
        }
    }

    /// Creates a card at the top of `column_uuid`.
    ///
    /// A missing or blank `name` falls back to the configured default.
    pub fn add_new(
        &self,
        board_uuid: BoardId,
        column_uuid: ColumnId,
        name: Option<String>,
        issue_no: Option<String>,
        url: Option<String>,
    ) -> Result<CardMove, CardServiceError> {
        let name = normalize_optional(name).unwrap_or_else(|| self.default_card_name.clone());
        let mut draft = NewCard::new(board_uuid, name);
        draft.issue_no = normalize_optional(issue_no);
        draft.url = normalize_optional(url);
        self.create_card(draft, column_uuid, ADD_NEW_POSITION)
    }

    /// Creates a card from a draft at `position` of `column_uuid`.
    pub fn create_card(
        &self,
        mut draft: NewCard,
        column_uuid: ColumnId,
        position: i64,
    ) -> Result<CardMove, CardServiceError> {
        draft.name = normalize_display_name(&draft.name)?;
        self.ensure_column_on_board(column_uuid, draft.board_uuid)?;

        let card = self.repo.create_card(&draft, column_uuid, position)?;
        let result = CardMove { card, before: None };
        log_mutation("card_create", &result);
        Ok(result)
    }

    pub fn get_card(&self, card_uuid: CardId) -> Result<Card, CardServiceError> {
        self.repo
            .get_card(card_uuid)?
            .ok_or(CardServiceError::CardNotFound(card_uuid))
    }

    /// Cards of a column ordered by position.
    pub fn list_cards(&self, column_uuid: ColumnId) -> Result<Vec<Card>, CardServiceError> {
        self.repo
            .column_board(column_uuid)?
            .ok_or(CardServiceError::ColumnNotFound(column_uuid))?;
        Ok(self.repo.list_cards(column_uuid)?)
    }

    /// Places an unplaced card at `position` of `column_uuid`.
    pub fn insert(
        &self,
        card_uuid: CardId,
        column_uuid: ColumnId,
        position: i64,
    ) -> Result<CardMove, CardServiceError> {
        let before = self.get_card(card_uuid)?;
        self.ensure_column_on_board(column_uuid, before.board_uuid)?;

        let card = self.repo.insert_card(card_uuid, column_uuid, position)?;
        let result = CardMove {
            card,
            before: before.placement(),
        };
        log_mutation("card_insert", &result);
        Ok(result)
    }

    /// Reorders a card inside its current column.
    pub fn move_within(
        &self,
        card_uuid: CardId,
        position: i64,
    ) -> Result<CardMove, CardServiceError> {
        let before = self.get_card(card_uuid)?;
        let before = before
            .placement()
            .ok_or(CardServiceError::CardUnplaced(card_uuid))?;

        let card = self.repo.move_within(card_uuid, position)?;
        let result = CardMove {
            card,
            before: Some(before),
        };
        log_mutation("card_move_within", &result);
        Ok(result)
    }

    /// Moves a card to another column of the same board.
    pub fn move_across(
        &self,
        card_uuid: CardId,
        column_uuid: ColumnId,
        position: i64,
    ) -> Result<CardMove, CardServiceError> {
        let before = self.get_card(card_uuid)?;
        let placement = before
            .placement()
            .ok_or(CardServiceError::CardUnplaced(card_uuid))?;
        self.ensure_column_on_board(column_uuid, before.board_uuid)?;

        let card = self.repo.move_across(card_uuid, column_uuid, position)?;
        let result = CardMove {
            card,
            before: Some(placement),
        };
        log_mutation("card_move_across", &result);
        Ok(result)
    }

    /// Reorders within the current column or moves across, by target.
    pub fn move_to(
        &self,
        card_uuid: CardId,
        column_uuid: ColumnId,
        position: i64,
    ) -> Result<CardMove, CardServiceError> {
        let card = self.get_card(card_uuid)?;
        if card.column_uuid == Some(column_uuid) {
            self.move_within(card_uuid, position)
        } else {
            self.move_across(card_uuid, column_uuid, position)
        }
    }

    /// Detaches a card from its column, closing the gap.
    pub fn remove(&self, card_uuid: CardId) -> Result<CardMove, CardServiceError> {
        let before = self.get_card(card_uuid)?;
        let placement = before
            .placement()
            .ok_or(CardServiceError::CardUnplaced(card_uuid))?;

        let card = self.repo.remove_card(card_uuid)?;
        let result = CardMove {
            card,
            before: Some(placement),
        };
        log_mutation("card_remove", &result);
        Ok(result)
    }

    /// Deletes a card. Returns its last state.
    pub fn delete(&self, card_uuid: CardId) -> Result<Card, CardServiceError> {
        let card = self.get_card(card_uuid)?;
        self.repo.delete_card(card_uuid)?;
        info!("event=card_delete module=card status=ok card_uuid={card_uuid}");
        Ok(card)
    }

    /// Changes the card color. Invalid colors leave the card untouched.
    pub fn change_color(&self, card_uuid: CardId, color: &str) -> Result<Card, CardServiceError> {
        let color = CardColor::parse(color)?;
        self.update_with(card_uuid, |card| card.color = color)
    }

    pub fn rename(&self, card_uuid: CardId, name: &str) -> Result<Card, CardServiceError> {
        let name = normalize_display_name(name)?;
        self.update_with(card_uuid, |card| card.name = name)
    }

    pub fn update_notes(
        &self,
        card_uuid: CardId,
        notes: impl Into<String>,
    ) -> Result<Card, CardServiceError> {
        let notes = notes.into();
        self.update_with(card_uuid, |card| card.notes = notes)
    }

    /// Replaces the card's tag set with the normalized `tags`.
    pub fn set_tags(&self, card_uuid: CardId, tags: &[String]) -> Result<Card, CardServiceError> {
        self.repo.set_card_tags(card_uuid, &normalize_tags(tags))?;
        self.get_card(card_uuid)
    }

    fn update_with(
        &self,
        card_uuid: CardId,
        apply: impl FnOnce(&mut Card),
    ) -> Result<Card, CardServiceError> {
        let mut card = self.get_card(card_uuid)?;
        apply(&mut card);
        self.repo.update_card(&card)?;
        self.get_card(card_uuid)
    }

    fn ensure_column_on_board(
        &self,
        column_uuid: ColumnId,
        board_uuid: BoardId,
    ) -> Result<(), CardServiceError> {
        match self.repo.column_board(column_uuid)? {
            None => Err(CardServiceError::ColumnNotFound(column_uuid)),
            Some(owner) if owner == board_uuid => Ok(()),
            Some(_) => Err(CardServiceError::ColumnNotOnBoard {
                column_uuid,
                board_uuid,
            }),
        }
    }
}

fn log_mutation(event: &str, result: &CardMove) {
    let describe = |placement: Option<CardPlacement>| match placement {
        Some(placement) => format!("{}:{}", placement.column_uuid, placement.position),
        None => "none".to_string(),
    };
    info!(
        "event={event} module=card status=ok card_uuid={} before={} after={}",
        result.card.uuid,
        describe(result.before),
        describe(result.after())
    );
}
