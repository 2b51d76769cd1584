use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{SectionRepository, StoreError, StoreResult, SubItemRepository};
use crate::model::{
    MediaCollection, MediaColumns, NewSection, NewSubItem, Section, SectionPatch, SubItem,
    SubItemPatch, SubItemRow,
};

const SECTION_COLUMNS: &str =
    "id, title, icon, color, description, order_index, created_at, updated_at";

const SUB_ITEM_COLUMNS: &str = "id, section_id, title, description, order_index, \
     media_urls, media_types, media_items, created_at, updated_at";

/// Sections stored in PostgreSQL.
#[derive(Clone)]
pub struct PgSectionRepository {
    pool: PgPool,
}

impl PgSectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SectionRepository for PgSectionRepository {
    async fn list(&self) -> StoreResult<Vec<Section>> {
        let sections = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections ORDER BY order_index, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Section>> {
        let section = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(section)
    }

    async fn insert(&self, section: NewSection) -> StoreResult<Section> {
        let created = sqlx::query_as::<_, Section>(&format!(
            "INSERT INTO sections (title, icon, color, description, order_index) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SECTION_COLUMNS}"
        ))
        .bind(&section.title)
        .bind(&section.icon)
        .bind(&section.color)
        .bind(&section.description)
        .bind(section.order_index)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: SectionPatch) -> StoreResult<Section> {
        sqlx::query_as::<_, Section>(&format!(
            "UPDATE sections SET \
                title = COALESCE($2, title), \
                icon = COALESCE($3, icon), \
                color = COALESCE($4, color), \
                description = COALESCE($5, description), \
                order_index = COALESCE($6, order_index), \
                updated_at = now() \
             WHERE id = $1 RETURNING {SECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.icon)
        .bind(patch.color)
        .bind(patch.description)
        .bind(patch.order_index)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

/// Sub-items stored in PostgreSQL, with the media collection flattened into
/// `media_urls`, `media_types` and `media_items`.
#[derive(Clone)]
pub struct PgSubItemRepository {
    pool: PgPool,
}

impl PgSubItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubItemRepository for PgSubItemRepository {
    async fn list_for_section(&self, section_id: Uuid) -> StoreResult<Vec<SubItem>> {
        let rows = sqlx::query_as::<_, SubItemRow>(&format!(
            "SELECT {SUB_ITEM_COLUMNS} FROM sub_items \
             WHERE section_id = $1 ORDER BY order_index, created_at"
        ))
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SubItem::from).collect())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<SubItem>> {
        let row = sqlx::query_as::<_, SubItemRow>(&format!(
            "SELECT {SUB_ITEM_COLUMNS} FROM sub_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SubItem::from))
    }

    async fn insert(&self, item: NewSubItem) -> StoreResult<SubItem> {
        let row = sqlx::query_as::<_, SubItemRow>(&format!(
            "INSERT INTO sub_items (section_id, title, description, order_index) \
             VALUES ($1, $2, $3, $4) RETURNING {SUB_ITEM_COLUMNS}"
        ))
        .bind(item.section_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.order_index)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, patch: SubItemPatch) -> StoreResult<SubItem> {
        let row = sqlx::query_as::<_, SubItemRow>(&format!(
            "UPDATE sub_items SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                order_index = COALESCE($4, order_index), \
                updated_at = now() \
             WHERE id = $1 RETURNING {SUB_ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.order_index)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;
        Ok(row.into())
    }

    async fn update_media(&self, id: Uuid, media: &MediaCollection) -> StoreResult<()> {
        let MediaColumns {
            media_urls,
            media_types,
            media_items,
        } = MediaColumns::from(media);

        let result = sqlx::query(
            "UPDATE sub_items SET media_urls = $2, media_types = $3, media_items = $4, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(media_urls)
        .bind(media_types)
        .bind(media_items.map(Json))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM sub_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
