//! In-memory repositories with switchable failures, used in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SectionRepository, StoreError, StoreResult, SubItemRepository};
use crate::model::{
    MediaCollection, NewSection, NewSubItem, Section, SectionPatch, SubItem, SubItemPatch,
};

#[derive(Default)]
struct Tables {
    sections: HashMap<Uuid, Section>,
    sub_items: HashMap<Uuid, SubItem>,
}

/// Both tables behind one lock. Deleting a section cascades to its
/// sub-items, like the foreign key in the SQL schema.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
    fail_media_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `update_media` call fail.
    pub fn fail_media_writes(&self, fail: bool) {
        self.fail_media_writes.store(fail, Ordering::SeqCst);
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SectionRepository for MemoryRepository {
    async fn list(&self) -> StoreResult<Vec<Section>> {
        let mut sections: Vec<Section> = self.read().sections.values().cloned().collect();
        sections.sort_by_key(|s| (s.order_index, s.created_at));
        Ok(sections)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Section>> {
        Ok(self.read().sections.get(&id).cloned())
    }

    async fn insert(&self, section: NewSection) -> StoreResult<Section> {
        let now = Utc::now();
        let created = Section {
            id: Uuid::now_v7(),
            title: section.title,
            icon: section.icon,
            color: section.color,
            description: section.description,
            order_index: section.order_index,
            created_at: now,
            updated_at: now,
        };
        self.write().sections.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: SectionPatch) -> StoreResult<Section> {
        let mut tables = self.write();
        let section = tables.sections.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = patch.title {
            section.title = title;
        }
        if let Some(icon) = patch.icon {
            section.icon = icon;
        }
        if let Some(color) = patch.color {
            section.color = color;
        }
        if let Some(description) = patch.description {
            section.description = description;
        }
        if let Some(order_index) = patch.order_index {
            section.order_index = order_index;
        }
        section.updated_at = Utc::now();
        Ok(section.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.write();
        tables.sections.remove(&id).ok_or(StoreError::NotFound(id))?;
        tables.sub_items.retain(|_, item| item.section_id != id);
        Ok(())
    }
}

#[async_trait]
impl SubItemRepository for MemoryRepository {
    async fn list_for_section(&self, section_id: Uuid) -> StoreResult<Vec<SubItem>> {
        let mut items: Vec<SubItem> = self
            .read()
            .sub_items
            .values()
            .filter(|item| item.section_id == section_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.order_index, item.created_at));
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<SubItem>> {
        Ok(self.read().sub_items.get(&id).cloned())
    }

    async fn insert(&self, item: NewSubItem) -> StoreResult<SubItem> {
        let mut tables = self.write();
        if !tables.sections.contains_key(&item.section_id) {
            return Err(StoreError::NotFound(item.section_id));
        }
        let now = Utc::now();
        let created = SubItem {
            id: Uuid::now_v7(),
            section_id: item.section_id,
            title: item.title,
            description: item.description,
            order_index: item.order_index,
            media: MediaCollection::new(),
            created_at: now,
            updated_at: now,
        };
        tables.sub_items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: SubItemPatch) -> StoreResult<SubItem> {
        let mut tables = self.write();
        let item = tables.sub_items.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(order_index) = patch.order_index {
            item.order_index = order_index;
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn update_media(&self, id: Uuid, media: &MediaCollection) -> StoreResult<()> {
        if self.fail_media_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("media write rejected".to_string()));
        }
        let mut tables = self.write();
        let item = tables.sub_items.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        item.media = media.clone();
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.write()
            .sub_items
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
