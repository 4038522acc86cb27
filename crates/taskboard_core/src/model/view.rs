//! Serializable card projection for external consumers.
//!
//! Excludes bookkeeping timestamps and the owning board id; optional
//! reference fields are omitted entirely when absent.

use crate::model::card::{Card, CardId, ColumnId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Card snapshot handed to request/notification layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub column_id: Option<ColumnId>,
    pub position: Option<u32>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: String,
    pub notes: String,
    pub tag_list: Vec<String>,
    /// Current remaining effort.
    pub hours_left: u32,
    /// When the current remaining effort was recorded.
    pub hours_left_updated: Option<DateTime<Utc>>,
}

impl CardView {
    pub fn new(card: &Card, hours_left: u32, hours_left_updated: Option<DateTime<Utc>>) -> Self {
        Self {
            id: card.uuid,
            column_id: card.column_uuid,
            position: card.position,
            name: card.name.clone(),
            issue_no: card.issue_no.clone(),
            url: card.url.clone(),
            color: card.color.to_string(),
            notes: card.notes.clone(),
            tag_list: card.tags.clone(),
            hours_left,
            hours_left_updated,
        }
    }
}
