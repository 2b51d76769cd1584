//! Row-oriented persistence for sections and sub-items.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    MediaCollection, NewSection, NewSubItem, Section, SectionPatch, SubItem, SubItemPatch,
};

pub use memory::MemoryRepository;
pub use postgres::{PgSectionRepository, PgSubItemRepository};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait SectionRepository: Send + Sync {
    /// All sections in display order.
    async fn list(&self) -> StoreResult<Vec<Section>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Section>>;

    async fn insert(&self, section: NewSection) -> StoreResult<Section>;

    async fn update(&self, id: Uuid, patch: SectionPatch) -> StoreResult<Section>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait SubItemRepository: Send + Sync {
    /// Sub-items of one section in display order.
    async fn list_for_section(&self, section_id: Uuid) -> StoreResult<Vec<SubItem>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<SubItem>>;

    async fn insert(&self, item: NewSubItem) -> StoreResult<SubItem>;

    async fn update(&self, id: Uuid, patch: SubItemPatch) -> StoreResult<SubItem>;

    /// Overwrite the whole media collection of a sub-item.
    async fn update_media(&self, id: Uuid, media: &MediaCollection) -> StoreResult<()>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}
