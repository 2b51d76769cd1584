use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events published after auth transitions and successful content writes,
/// consumed by SSE listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FolioEvent {
    #[serde(rename_all = "camelCase")]
    SignedIn { email: String, at: DateTime<Utc> },
    #[serde(rename_all = "camelCase")]
    SignedOut { email: String, at: DateTime<Utc> },
    /// A request presented a session that has expired or was revoked.
    #[serde(rename_all = "camelCase")]
    SessionInvalidated { reason: String, at: DateTime<Utc> },
    ContentChanged(ContentChange),
}

impl FolioEvent {
    /// Short name used as the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            FolioEvent::SignedIn { .. } => "signedIn",
            FolioEvent::SignedOut { .. } => "signedOut",
            FolioEvent::SessionInvalidated { .. } => "sessionInvalidated",
            FolioEvent::ContentChanged(_) => "contentChanged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Section,
    SubItem,
    Media,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChange {
    pub entity: EntityKind,
    pub id: Uuid,
    pub deleted: bool,
    pub timestamp: DateTime<Utc>,
}

impl ContentChange {
    pub fn updated(entity: EntityKind, id: Uuid) -> Self {
        Self {
            entity,
            id,
            deleted: false,
            timestamp: Utc::now(),
        }
    }

    pub fn deleted(entity: EntityKind, id: Uuid) -> Self {
        Self {
            deleted: true,
            ..Self::updated(entity, id)
        }
    }
}
