use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use super::media::{reconcile, stored_media_items, MediaCollection};

/// A portfolio entry inside a section, with its media collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubItem {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub media: MediaCollection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row representation of a sub-item.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubItemRow {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub media_urls: Vec<String>,
    pub media_types: Vec<String>,
    /// Decoded per entry on load, so one malformed entry cannot fail the row.
    pub media_items: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubItemRow> for SubItem {
    fn from(row: SubItemRow) -> Self {
        let items = row
            .media_items
            .map(|Json(raw)| stored_media_items(raw))
            .unwrap_or_default();
        let media = reconcile(row.media_urls, row.media_types, items);

        Self {
            id: row.id,
            section_id: row.section_id,
            title: row.title,
            description: row.description,
            order_index: row.order_index,
            media,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSubItem {
    pub section_id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
}

/// Partial update of the text fields. The media collection is only ever
/// changed through the media reference store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order_index: Option<i32>,
}
