//! Outbound change events for board viewers.
//!
//! # Responsibility
//! - Describe a completed card mutation in a transport-neutral shape.
//! - Define the sink interface a caller hands events to.
//!
//! # Invariants
//! - Services never hold a notifier; callers build a [`CardChange`] from a
//!   mutation result and publish it after the mutation succeeded.
//! - Events carry ids, name and placements only, never notes or tags.

use crate::model::card::{BoardId, Card, CardId, CardPlacement};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kind of card mutation being broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardChangeKind {
    AddCard,
    MoveCard,
    UpdateCardHours,
    ChangeCardColor,
    DeleteCard,
}

impl CardChangeKind {
    /// Stable wire name for the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddCard => "add_card",
            Self::MoveCard => "move_card",
            Self::UpdateCardHours => "update_card_hours",
            Self::ChangeCardColor => "change_card_color",
            Self::DeleteCard => "delete_card",
        }
    }
}

/// One card mutation addressed to everyone watching a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardChange {
    pub board_uuid: BoardId,
    pub kind: CardChangeKind,
    pub card_uuid: CardId,
    pub display_name: String,
    /// Placement before the mutation, when the card was placed.
    pub before: Option<CardPlacement>,
    /// Placement after the mutation, when the card is placed.
    pub after: Option<CardPlacement>,
}

impl CardChange {
    /// Builds an event for `card` as it is after the mutation.
    pub fn new(kind: CardChangeKind, card: &Card, before: Option<CardPlacement>) -> Self {
        Self {
            board_uuid: card.board_uuid,
            kind,
            card_uuid: card.uuid,
            display_name: card.short_name(),
            before,
            after: card.placement(),
        }
    }

    /// Whether the card changed column or position.
    pub fn is_reposition(&self) -> bool {
        self.before != self.after
    }
}

/// Errors reported by notification sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Sink could not deliver the event.
    Delivery(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivery(message) => write!(f, "change notification failed: {message}"),
        }
    }
}

impl Error for NotifyError {}

/// Sink for card change events, keyed by board on the receiving side.
pub trait ChangeNotifier {
    fn publish(&self, change: &CardChange) -> Result<(), NotifyError>;
}
