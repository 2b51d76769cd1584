use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::events::{ContentChange, EntityKind, EventBus, FolioEvent};
use crate::media::{resolve, thumbnail_src, EmbedTarget, MediaError, MediaReferenceStore};
use crate::model::validate::{self, FieldError};
use crate::model::{
    Media, NewSection, NewSubItem, Section, SectionIcon, SectionPatch, SubItem, SubItemPatch,
};
use crate::repo::{SectionRepository, StoreError, SubItemRepository};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Invalid(#[from] FieldError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

pub type ContentResult<T> = Result<T, ContentError>;

/// Public view of one section with everything needed to render it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSection {
    #[serde(flatten)]
    pub section: Section,
    pub display_icon: SectionIcon,
    pub items: Vec<PortfolioItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub media: Vec<PortfolioMedia>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMedia {
    #[serde(flatten)]
    pub media: Media,
    pub embed: EmbedTarget,
    pub thumbnail: String,
}

impl From<Media> for PortfolioMedia {
    fn from(media: Media) -> Self {
        Self {
            embed: resolve(&media),
            thumbnail: thumbnail_src(&media).to_string(),
            media,
        }
    }
}

impl From<SubItem> for PortfolioItem {
    fn from(item: SubItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            order_index: item.order_index,
            media: item.media.iter().cloned().map(PortfolioMedia::from).collect(),
        }
    }
}

/// Section and sub-item CRUD. Media collections are delegated to the
/// [`MediaReferenceStore`], which also owns sub-item deletion so blobs go
/// with their parent.
pub struct ContentService {
    sections: Arc<dyn SectionRepository>,
    items: Arc<dyn SubItemRepository>,
    media: Arc<MediaReferenceStore>,
    events: EventBus,
}

impl ContentService {
    pub fn new(
        sections: Arc<dyn SectionRepository>,
        items: Arc<dyn SubItemRepository>,
        media: Arc<MediaReferenceStore>,
        events: EventBus,
    ) -> Self {
        Self {
            sections,
            items,
            media,
            events,
        }
    }

    pub fn media(&self) -> &MediaReferenceStore {
        &self.media
    }

    pub async fn list_sections(&self) -> ContentResult<Vec<Section>> {
        Ok(self.sections.list().await?)
    }

    pub async fn get_section(&self, id: Uuid) -> ContentResult<Section> {
        self.sections
            .get(id)
            .await?
            .ok_or(ContentError::NotFound {
                entity: "section",
                id,
            })
    }

    pub async fn create_section(&self, section: NewSection) -> ContentResult<Section> {
        validate::validate_new_section(&section)?;
        let created = self.sections.insert(section).await?;
        tracing::info!(section_id = %created.id, title = %created.title, "created section");
        self.changed(ContentChange::updated(EntityKind::Section, created.id));
        Ok(created)
    }

    pub async fn update_section(&self, id: Uuid, patch: SectionPatch) -> ContentResult<Section> {
        validate::validate_section_patch(&patch)?;
        let updated = self
            .sections
            .update(id, patch)
            .await
            .map_err(|err| not_found(err, "section"))?;
        self.changed(ContentChange::updated(EntityKind::Section, id));
        Ok(updated)
    }

    /// Delete a section together with its sub-items and their blobs.
    pub async fn delete_section(&self, id: Uuid) -> ContentResult<()> {
        self.get_section(id).await?;
        for item in self.items.list_for_section(id).await? {
            match self.media.bulk_delete_parent(item.id).await {
                Ok(()) | Err(MediaError::ParentNotFound(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.sections
            .delete(id)
            .await
            .map_err(|err| not_found(err, "section"))?;
        tracing::info!(section_id = %id, "deleted section");
        self.changed(ContentChange::deleted(EntityKind::Section, id));
        Ok(())
    }

    pub async fn list_items(&self, section_id: Uuid) -> ContentResult<Vec<SubItem>> {
        self.get_section(section_id).await?;
        Ok(self.items.list_for_section(section_id).await?)
    }

    pub async fn get_item(&self, id: Uuid) -> ContentResult<SubItem> {
        self.items.get(id).await?.ok_or(ContentError::NotFound {
            entity: "sub-item",
            id,
        })
    }

    pub async fn create_item(&self, item: NewSubItem) -> ContentResult<SubItem> {
        validate::validate_new_sub_item(&item)?;
        self.get_section(item.section_id).await?;
        let created = self.items.insert(item).await?;
        tracing::info!(item_id = %created.id, section_id = %created.section_id, "created sub-item");
        self.changed(ContentChange::updated(EntityKind::SubItem, created.id));
        Ok(created)
    }

    pub async fn update_item(&self, id: Uuid, patch: SubItemPatch) -> ContentResult<SubItem> {
        validate::validate_sub_item_patch(&patch)?;
        let updated = self
            .items
            .update(id, patch)
            .await
            .map_err(|err| not_found(err, "sub-item"))?;
        self.changed(ContentChange::updated(EntityKind::SubItem, id));
        Ok(updated)
    }

    pub async fn delete_item(&self, id: Uuid) -> ContentResult<()> {
        match self.media.bulk_delete_parent(id).await {
            Err(MediaError::ParentNotFound(_)) => Err(ContentError::NotFound {
                entity: "sub-item",
                id,
            }),
            other => Ok(other?),
        }
    }

    /// Every section in order with its sub-items and resolved media.
    pub async fn portfolio(&self) -> ContentResult<Vec<PortfolioSection>> {
        let sections = self.sections.list().await?;
        let mut view = Vec::with_capacity(sections.len());
        for section in sections {
            let items = self.items.list_for_section(section.id).await?;
            view.push(PortfolioSection {
                display_icon: section.display_icon(),
                items: items.into_iter().map(PortfolioItem::from).collect(),
                section,
            });
        }
        Ok(view)
    }

    fn changed(&self, change: ContentChange) {
        self.events.publish(FolioEvent::ContentChanged(change));
    }
}

fn not_found(err: StoreError, entity: &'static str) -> ContentError {
    match err {
        StoreError::NotFound(id) => ContentError::NotFound { entity, id },
        other => ContentError::Store(other),
    }
}
