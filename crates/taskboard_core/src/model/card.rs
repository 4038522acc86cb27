//! Board, column and card records.
//!
//! # Responsibility
//! - Define the card shape used by ordering and persistence.
//! - Normalize display names and colors before they reach storage.
//!
//! # Invariants
//! - `column_uuid` and `position` are both set or both unset.
//! - `position` is 1-based when set.
//! - `CardColor` always holds a valid `#rrggbb` value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable board identifier.
pub type BoardId = Uuid;
/// Stable column identifier.
pub type ColumnId = Uuid;
/// Stable card identifier.
pub type CardId = Uuid;

/// Neutral color used when a card has no (valid) color.
pub const DEFAULT_CARD_COLOR: &str = "#ffffff";
/// Display name for cards added without one.
pub const DEFAULT_CARD_NAME: &str = "Empty!";

const SHORT_NAME_MAX_CHARS: usize = 30;
const SHORT_NAME_OMISSION: &str = "...";

static CARD_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid card color regex"));

/// Value-level validation failures for card fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    /// Display name is blank after trim.
    BlankName,
    /// Color is not in `#rrggbb` form.
    InvalidColor(String),
}

impl Display for CardValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "display name must not be blank"),
            Self::InvalidColor(value) => {
                write!(f, "invalid card color `{value}`; expected #rrggbb")
            }
        }
    }
}

impl Error for CardValidationError {}

/// Card background color in `#rrggbb` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardColor(String);

impl CardColor {
    /// Parses user input, rejecting anything that is not `#rrggbb`.
    pub fn parse(value: &str) -> Result<Self, CardValidationError> {
        let trimmed = value.trim();
        if CARD_COLOR_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(CardValidationError::InvalidColor(value.to_string()))
        }
    }

    /// Reads a persisted value; missing or malformed colors fall back to
    /// [`DEFAULT_CARD_COLOR`].
    pub fn from_stored(value: Option<&str>) -> Self {
        value
            .and_then(|raw| Self::parse(raw).ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CardColor {
    fn default() -> Self {
        Self(DEFAULT_CARD_COLOR.to_string())
    }
}

impl Display for CardColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Board read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub uuid: BoardId,
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Column read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub uuid: ColumnId,
    pub board_uuid: BoardId,
    pub name: String,
    /// Append-only rank of the column on its board (creation order).
    pub position: u32,
}

/// Where a card currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPlacement {
    pub column_uuid: ColumnId,
    /// 1-based rank within the column.
    pub position: u32,
}

/// Card read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Stable card id.
    pub uuid: CardId,
    /// Owning board. Never changes for the card lifetime.
    pub board_uuid: BoardId,
    /// Owning column. `None` while the card is unplaced.
    pub column_uuid: Option<ColumnId>,
    /// 1-based rank within `column_uuid`. `None` while unplaced.
    pub position: Option<u32>,
    /// User-facing label.
    pub name: String,
    /// External issue reference, e.g. `ISSUE-3456`.
    pub issue_no: Option<String>,
    pub url: Option<String>,
    pub color: CardColor,
    pub notes: String,
    /// Normalized (trimmed, lowercase, sorted) tag names.
    pub tags: Vec<String>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Card {
    /// Returns the current placement, or `None` for an unplaced card.
    pub fn placement(&self) -> Option<CardPlacement> {
        match (self.column_uuid, self.position) {
            (Some(column_uuid), Some(position)) => Some(CardPlacement {
                column_uuid,
                position,
            }),
            _ => None,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.placement().is_some()
    }

    /// Label for compact rendering: the issue reference when present,
    /// otherwise the display name truncated to 30 characters.
    pub fn short_name(&self) -> String {
        match self.issue_no.as_deref() {
            Some(issue_no) if !issue_no.trim().is_empty() => issue_no.to_string(),
            _ => truncate_chars(&self.name, SHORT_NAME_MAX_CHARS),
        }
    }
}

/// Input for creating a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub board_uuid: BoardId,
    pub name: String,
    pub issue_no: Option<String>,
    pub url: Option<String>,
    pub color: CardColor,
    pub notes: String,
}

impl NewCard {
    /// Creates a card draft with default color and empty notes.
    pub fn new(board_uuid: BoardId, name: impl Into<String>) -> Self {
        Self {
            board_uuid,
            name: name.into(),
            issue_no: None,
            url: None,
            color: CardColor::default(),
            notes: String::new(),
        }
    }
}

/// Trims a display name and rejects blank values.
pub fn normalize_display_name(value: &str) -> Result<String, CardValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CardValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

/// Trims an optional reference field; blank values become `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Normalizes and deduplicates tag names.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized = tags
        .iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>();
    normalized.sort();
    normalized.dedup();
    normalized
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let keep = max_chars.saturating_sub(SHORT_NAME_OMISSION.chars().count());
    let mut truncated = value.chars().take(keep).collect::<String>();
    truncated.push_str(SHORT_NAME_OMISSION);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_named(name: &str) -> Card {
        Card {
            uuid: Uuid::new_v4(),
            board_uuid: Uuid::new_v4(),
            column_uuid: None,
            position: None,
            name: name.to_string(),
            issue_no: None,
            url: None,
            color: CardColor::default(),
            notes: String::new(),
            tags: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn color_parse_accepts_mixed_case_hex() {
        assert_eq!(CardColor::parse("#fc0FC0").unwrap().as_str(), "#fc0FC0");
    }

    #[test]
    fn color_parse_rejects_malformed_values() {
        for raw in ["not so valid", "#fff", "fc0fc0", "#fc0fc0a", "#gg0000"] {
            assert!(
                matches!(CardColor::parse(raw), Err(CardValidationError::InvalidColor(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn stored_color_falls_back_to_default() {
        assert_eq!(CardColor::from_stored(None).as_str(), DEFAULT_CARD_COLOR);
        assert_eq!(CardColor::from_stored(Some("red")).as_str(), DEFAULT_CARD_COLOR);
        assert_eq!(CardColor::from_stored(Some("#00ff00")).as_str(), "#00ff00");
    }

    #[test]
    fn short_name_prefers_issue_reference() {
        let mut card = card_named("Support for Firefox 3.0");
        card.issue_no = Some("ISSUE-3456".to_string());
        assert_eq!(card.short_name(), "ISSUE-3456");
    }

    #[test]
    fn short_name_truncates_long_names_to_thirty_chars() {
        let card = card_named("This is some very long name that needs to be shortened");
        let short = card.short_name();
        assert_eq!(short.chars().count(), 30);
        assert!(short.starts_with("This is some very long"));
        assert!(short.ends_with("..."));
    }

    #[test]
    fn placement_requires_column_and_position() {
        let mut card = card_named("a");
        assert!(!card.is_placed());
        card.column_uuid = Some(Uuid::new_v4());
        assert!(card.placement().is_none());
        card.position = Some(2);
        assert_eq!(card.placement().map(|p| p.position), Some(2));
    }

    #[test]
    fn normalize_tags_dedups_and_drops_blank() {
        let tags = vec![
            " Ala ".to_string(),
            "ma".to_string(),
            "ALA".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["ala".to_string(), "ma".to_string()]);
    }
}
