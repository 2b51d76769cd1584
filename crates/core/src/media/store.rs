//! Media reference store.
//!
//! Keeps the media collection of each sub-item in step with the remote
//! record. Every mutation reads the canonical record, applies the change,
//! and writes the whole collection back. When the write fails the local view
//! is thrown away and re-fetched, so the view may be stale but never holds
//! entries the database does not.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::error::MediaError;
use super::input::ValidatedMedia;
use crate::events::{ContentChange, EntityKind, EventBus, FolioEvent};
use crate::model::{Media, MediaCollection, MediaKind};
use crate::repo::SubItemRepository;
use crate::storage::{BlobKey, BlobStore};

/// Where a parent's collection is in its mutation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    #[default]
    Idle,
    Mutating,
    Resyncing,
}

#[derive(Debug, Clone, Default)]
struct ParentView {
    collection: Option<MediaCollection>,
    state: SyncState,
}

/// Per-parent serialisation point plus the cached view.
#[derive(Default)]
struct ParentSlot {
    lock: tokio::sync::Mutex<()>,
    view: Mutex<ParentView>,
}

impl ParentSlot {
    fn view(&self) -> std::sync::MutexGuard<'_, ParentView> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: SyncState) {
        self.view().state = state;
    }

    fn set_collection(&self, collection: Option<MediaCollection>) {
        self.view().collection = collection;
    }
}

pub struct MediaReferenceStore {
    items: Arc<dyn SubItemRepository>,
    blobs: Arc<dyn BlobStore>,
    events: EventBus,
    parents: Mutex<HashMap<Uuid, Arc<ParentSlot>>>,
}

impl MediaReferenceStore {
    pub fn new(
        items: Arc<dyn SubItemRepository>,
        blobs: Arc<dyn BlobStore>,
        events: EventBus,
    ) -> Self {
        Self {
            items,
            blobs,
            events,
            parents: Mutex::new(HashMap::new()),
        }
    }

    /// Last known collection of `parent_id`, if it has been loaded.
    pub fn collection(&self, parent_id: Uuid) -> Option<MediaCollection> {
        self.existing_slot(parent_id)
            .and_then(|slot| slot.view().collection.clone())
    }

    pub fn sync_state(&self, parent_id: Uuid) -> SyncState {
        self.existing_slot(parent_id)
            .map(|slot| slot.view().state)
            .unwrap_or_default()
    }

    /// Fetch the canonical collection and refresh the local view.
    pub async fn load(&self, parent_id: Uuid) -> Result<MediaCollection, MediaError> {
        let slot = self.slot(parent_id);
        let _guard = slot.lock.lock().await;
        self.fetch(parent_id, &slot).await
    }

    /// Append a validated media value, uploading its file first if needed.
    pub async fn add(
        &self,
        parent_id: Uuid,
        media: ValidatedMedia,
    ) -> Result<MediaCollection, MediaError> {
        let slot = self.slot(parent_id);
        let _guard = slot.lock.lock().await;
        let current = self.fetch(parent_id, &slot).await?;
        slot.set_state(SyncState::Mutating);

        let (media, uploaded) = match media {
            ValidatedMedia::Ready(media) => (media, None),
            ValidatedMedia::PendingFile { upload, metadata } => {
                let key = BlobKey::for_upload(parent_id, &upload.file_name, Utc::now());
                if let Err(err) = self.blobs.upload(&key, upload.bytes).await {
                    tracing::warn!(%parent_id, %key, error = %err, "media upload rejected");
                    slot.set_state(SyncState::Idle);
                    return Err(MediaError::Upload(err));
                }
                let media = Media {
                    kind: MediaKind::File,
                    url: self.blobs.public_url(&key),
                    metadata,
                };
                (media, Some(key))
            }
        };

        let mut next = current;
        next.push(media);

        match self.persist(parent_id, &slot, next).await {
            Ok(collection) => Ok(collection),
            Err(err) => {
                if let Some(key) = uploaded {
                    self.remove_blobs(parent_id, vec![key]).await;
                }
                Err(err)
            }
        }
    }

    /// Remove the entry at `index`. Out-of-range indexes leave everything as is.
    ///
    /// The reference is dropped before the blob: an orphaned blob is
    /// tolerable, a reference to a deleted blob is not.
    pub async fn remove(
        &self,
        parent_id: Uuid,
        index: usize,
    ) -> Result<MediaCollection, MediaError> {
        let slot = self.slot(parent_id);
        let _guard = slot.lock.lock().await;
        let mut next = self.fetch(parent_id, &slot).await?;

        let Some(removed) = next.remove(index) else {
            tracing::warn!(%parent_id, index, len = next.len(), "media index out of range");
            return Ok(next);
        };
        slot.set_state(SyncState::Mutating);

        let collection = self.persist(parent_id, &slot, next).await?;
        if removed.is_file() {
            let keys = self.blobs.key_for_url(&removed.url).into_iter().collect();
            self.remove_blobs(parent_id, keys).await;
        }
        Ok(collection)
    }

    /// Delete every file blob of the sub-item, then the sub-item itself.
    /// Blob failures are logged and do not stop the record deletion.
    pub async fn bulk_delete_parent(&self, parent_id: Uuid) -> Result<(), MediaError> {
        let slot = self.slot(parent_id);
        let _guard = slot.lock.lock().await;
        let collection = self.fetch(parent_id, &slot).await?;
        slot.set_state(SyncState::Mutating);

        let keys = collection
            .file_urls()
            .filter_map(|url| self.blobs.key_for_url(url))
            .collect();
        self.remove_blobs(parent_id, keys).await;

        if let Err(err) = self.items.delete(parent_id).await {
            tracing::error!(%parent_id, error = %err, "failed to delete sub-item");
            self.resync(parent_id, &slot).await;
            return Err(MediaError::Persist(err));
        }

        self.forget(parent_id);
        self.events.publish(FolioEvent::ContentChanged(ContentChange::deleted(
            EntityKind::SubItem,
            parent_id,
        )));
        tracing::info!(%parent_id, "deleted sub-item and its media");
        Ok(())
    }

    async fn fetch(
        &self,
        parent_id: Uuid,
        slot: &ParentSlot,
    ) -> Result<MediaCollection, MediaError> {
        match self.items.get(parent_id).await? {
            Some(item) => {
                slot.set_collection(Some(item.media.clone()));
                Ok(item.media)
            }
            None => {
                self.forget(parent_id);
                Err(MediaError::ParentNotFound(parent_id))
            }
        }
    }

    async fn persist(
        &self,
        parent_id: Uuid,
        slot: &ParentSlot,
        next: MediaCollection,
    ) -> Result<MediaCollection, MediaError> {
        slot.set_collection(Some(next.clone()));
        match self.items.update_media(parent_id, &next).await {
            Ok(()) => {
                slot.set_state(SyncState::Idle);
                self.events.publish(FolioEvent::ContentChanged(ContentChange::updated(
                    EntityKind::Media,
                    parent_id,
                )));
                tracing::debug!(%parent_id, len = next.len(), "persisted media collection");
                Ok(next)
            }
            Err(err) => {
                tracing::error!(%parent_id, error = %err, "failed to persist media collection");
                self.resync(parent_id, slot).await;
                Err(MediaError::Persist(err))
            }
        }
    }

    async fn resync(&self, parent_id: Uuid, slot: &ParentSlot) {
        slot.set_state(SyncState::Resyncing);
        match self.items.get(parent_id).await {
            Ok(Some(item)) => slot.set_collection(Some(item.media)),
            Ok(None) => {
                slot.set_collection(None);
                self.forget(parent_id);
            }
            Err(err) => {
                // Without the canonical state the view is dropped rather than guessed.
                tracing::error!(%parent_id, error = %err, "resync failed");
                slot.set_collection(None);
            }
        }
        slot.set_state(SyncState::Idle);
    }

    async fn remove_blobs(&self, parent_id: Uuid, keys: Vec<BlobKey>) {
        if keys.is_empty() {
            return;
        }
        if let Err(err) = self.blobs.remove(&keys).await {
            tracing::warn!(%parent_id, error = %err, "leaving orphaned media blobs");
        }
    }

    fn parents(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Arc<ParentSlot>>> {
        self.parents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn slot(&self, parent_id: Uuid) -> Arc<ParentSlot> {
        self.parents().entry(parent_id).or_default().clone()
    }

    fn existing_slot(&self, parent_id: Uuid) -> Option<Arc<ParentSlot>> {
        self.parents().get(&parent_id).cloned()
    }

    fn forget(&self, parent_id: Uuid) {
        self.parents().remove(&parent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::input::{FileUpload, MediaInput};
    use crate::media::EmbedResolver;
    use crate::model::{MediaColumns, MediaMetadata, NewSection, NewSubItem};
    use crate::repo::{MemoryRepository, SectionRepository};
    use crate::storage::MemoryBlobStore;
    use bytes::Bytes;

    struct Fixture {
        repo: Arc<MemoryRepository>,
        blobs: Arc<MemoryBlobStore>,
        store: Arc<MediaReferenceStore>,
        parent: Uuid,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let section = SectionRepository::insert(
            repo.as_ref(),
            NewSection {
                title: "Media".into(),
                icon: "Camera".into(),
                color: "#3A6EA5".into(),
                description: String::new(),
                order_index: 1,
            },
        )
        .await
        .unwrap();
        let item = SubItemRepository::insert(
            repo.as_ref(),
            NewSubItem {
                section_id: section.id,
                title: "Showreel".into(),
                description: String::new(),
                order_index: 0,
            },
        )
        .await
        .unwrap();
        let store = Arc::new(MediaReferenceStore::new(
            repo.clone(),
            blobs.clone(),
            EventBus::new(64),
        ));
        Fixture {
            repo,
            blobs,
            store,
            parent: item.id,
        }
    }

    fn youtube(id: &str) -> ValidatedMedia {
        EmbedResolver::default()
            .validate(MediaInput::youtube(
                format!("https://youtu.be/{id}"),
                MediaMetadata::titled(format!("clip {id}")),
            ))
            .unwrap()
    }

    fn photo(name: &str) -> ValidatedMedia {
        EmbedResolver::default()
            .validate(MediaInput::file(
                FileUpload {
                    file_name: name.into(),
                    content_type: Some("image/png".into()),
                    bytes: Bytes::from_static(b"\x89PNG"),
                },
                MediaMetadata::titled(name),
            ))
            .unwrap()
    }

    async fn remote(f: &Fixture) -> MediaCollection {
        SubItemRepository::get(f.repo.as_ref(), f.parent)
            .await
            .unwrap()
            .unwrap()
            .media
    }

    fn assert_aligned(collection: &MediaCollection) {
        let columns = MediaColumns::from(collection);
        let items = columns.media_items.unwrap();
        assert_eq!(columns.media_urls.len(), columns.media_types.len());
        assert_eq!(items.len(), columns.media_urls.len());
    }

    #[tokio::test]
    async fn add_youtube_appends_and_persists() {
        let f = fixture().await;
        let collection = f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(0).unwrap().kind, MediaKind::Youtube);
        assert_eq!(remote(&f).await, collection);
        assert_eq!(f.store.collection(f.parent), Some(collection));
        assert_eq!(f.store.sync_state(f.parent), SyncState::Idle);
        assert!(f.blobs.is_empty());
    }

    #[tokio::test]
    async fn add_file_uploads_under_parent_namespace() {
        let f = fixture().await;
        let collection = f.store.add(f.parent, photo("cover.png")).await.unwrap();

        let entry = collection.get(0).unwrap();
        assert_eq!(entry.kind, MediaKind::File);
        assert_eq!(entry.metadata.alt_text.as_deref(), Some("cover.png"));

        let key = f.blobs.key_for_url(&entry.url).unwrap();
        assert_eq!(key.parent_id(), Some(f.parent));
        assert!(f.blobs.contains(&key));
        assert_eq!(remote(&f).await, collection);
    }

    #[tokio::test]
    async fn rejected_upload_changes_nothing() {
        let f = fixture().await;
        f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();
        f.blobs.reject_uploads(true);

        let err = f.store.add(f.parent, photo("big.png")).await.unwrap_err();
        assert!(matches!(err, MediaError::Upload(_)));
        assert_eq!(remote(&f).await.len(), 1);
        assert_eq!(f.store.collection(f.parent).unwrap().len(), 1);
        assert_eq!(f.store.sync_state(f.parent), SyncState::Idle);
        assert!(f.blobs.is_empty());
    }

    #[tokio::test]
    async fn persist_failure_resyncs_from_remote() {
        let f = fixture().await;
        f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();
        f.repo.fail_media_writes(true);

        let err = f.store.add(f.parent, photo("extra.png")).await.unwrap_err();
        assert!(matches!(err, MediaError::Persist(_)));

        let fresh = remote(&f).await;
        assert_eq!(f.store.collection(f.parent), Some(fresh.clone()));
        assert_eq!(fresh.len(), 1);
        assert_eq!(f.store.sync_state(f.parent), SyncState::Idle);
        // The blob uploaded for the dropped entry is cleaned up.
        assert!(f.blobs.is_empty());
    }

    #[tokio::test]
    async fn remove_drops_entry_and_blob() {
        let f = fixture().await;
        f.store.add(f.parent, photo("a.png")).await.unwrap();
        f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();
        let before = f.store.add(f.parent, photo("c.png")).await.unwrap();
        let removed_key = f.blobs.key_for_url(&before.get(0).unwrap().url).unwrap();

        let after = f.store.remove(f.parent, 0).await.unwrap();

        assert_eq!(after.as_slice(), &before.as_slice()[1..]);
        assert!(!f.blobs.contains(&removed_key));
        assert_eq!(f.blobs.len(), 1);
        assert_eq!(remote(&f).await, after);
        assert_aligned(&after);
    }

    #[tokio::test]
    async fn remove_out_of_range_is_a_noop() {
        let f = fixture().await;
        let before = f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();

        let after = f.store.remove(f.parent, 5).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(remote(&f).await, before);
    }

    #[tokio::test]
    async fn blob_removal_failure_still_drops_reference() {
        let f = fixture().await;
        f.store.add(f.parent, photo("a.png")).await.unwrap();
        f.blobs.fail_removals(true);

        let after = f.store.remove(f.parent, 0).await.unwrap();
        assert!(after.is_empty());
        assert!(remote(&f).await.is_empty());
        assert_eq!(f.blobs.len(), 1);
    }

    #[tokio::test]
    async fn persist_failure_on_remove_keeps_blob_and_entry() {
        let f = fixture().await;
        let before = f.store.add(f.parent, photo("a.png")).await.unwrap();
        f.repo.fail_media_writes(true);

        let err = f.store.remove(f.parent, 0).await.unwrap_err();
        assert!(matches!(err, MediaError::Persist(_)));
        assert_eq!(f.store.collection(f.parent), Some(before.clone()));
        assert_eq!(remote(&f).await, before);
        assert_eq!(f.blobs.len(), 1);
    }

    #[tokio::test]
    async fn add_then_remove_last_restores_content() {
        let f = fixture().await;
        f.store.add(f.parent, photo("a.png")).await.unwrap();
        let before = f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();

        let grown = f.store.add(f.parent, photo("b.webp")).await.unwrap();
        let restored = f.store.remove(f.parent, grown.len() - 1).await.unwrap();

        assert_eq!(restored, before);
        assert_eq!(f.blobs.len(), 1);
    }

    #[tokio::test]
    async fn bulk_delete_removes_blobs_and_record() {
        let f = fixture().await;
        f.store.add(f.parent, photo("a.png")).await.unwrap();
        f.store.add(f.parent, photo("b.png")).await.unwrap();
        f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();

        f.store.bulk_delete_parent(f.parent).await.unwrap();

        assert!(f.blobs.is_empty());
        assert!(SubItemRepository::get(f.repo.as_ref(), f.parent)
            .await
            .unwrap()
            .is_none());
        assert_eq!(f.store.collection(f.parent), None);
    }

    #[tokio::test]
    async fn bulk_delete_survives_blob_failures() {
        let f = fixture().await;
        f.store.add(f.parent, photo("a.png")).await.unwrap();
        f.blobs.fail_removals(true);

        f.store.bulk_delete_parent(f.parent).await.unwrap();
        assert!(SubItemRepository::get(f.repo.as_ref(), f.parent)
            .await
            .unwrap()
            .is_none());
        assert_eq!(f.blobs.len(), 1);
    }

    #[tokio::test]
    async fn unknown_parent_is_reported() {
        let f = fixture().await;
        let missing = Uuid::new_v4();
        assert!(matches!(
            f.store.add(missing, youtube("dQw4w9WgXcQ")).await,
            Err(MediaError::ParentNotFound(id)) if id == missing
        ));
        assert!(matches!(
            f.store.bulk_delete_parent(missing).await,
            Err(MediaError::ParentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_parents_are_not_tracked() {
        let f = fixture().await;
        for _ in 0..3 {
            let missing = Uuid::new_v4();
            assert!(f.store.load(missing).await.is_err());
            assert!(f.store.add(missing, youtube("dQw4w9WgXcQ")).await.is_err());
            assert!(f.store.remove(missing, 0).await.is_err());
        }
        assert!(f.store.parents().is_empty());
    }

    #[tokio::test]
    async fn externally_deleted_parent_is_forgotten() {
        let f = fixture().await;
        f.store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();
        assert!(f.store.collection(f.parent).is_some());

        SubItemRepository::delete(f.repo.as_ref(), f.parent).await.unwrap();
        assert!(matches!(
            f.store.load(f.parent).await,
            Err(MediaError::ParentNotFound(_))
        ));
        assert!(f.store.collection(f.parent).is_none());
        assert_eq!(f.store.sync_state(f.parent), SyncState::Idle);
        assert!(f.store.existing_slot(f.parent).is_none());
    }

    #[tokio::test]
    async fn concurrent_adds_are_serialised_per_parent() {
        let f = fixture().await;
        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..16 {
            let store = f.store.clone();
            let parent = f.parent;
            tasks.spawn(async move {
                let media = if n % 2 == 0 {
                    photo(&format!("{n}.png"))
                } else {
                    youtube(&format!("{n:011}"))
                };
                store.add(parent, media).await.map(|_| ())
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        let collection = remote(&f).await;
        assert_eq!(collection.len(), 16);
        assert_eq!(f.blobs.len(), 8);
        assert_aligned(&collection);
    }

    #[tokio::test]
    async fn successful_mutation_publishes_event() {
        let f = fixture().await;
        let events = EventBus::new(8);
        let store = MediaReferenceStore::new(f.repo.clone(), f.blobs.clone(), events.clone());
        let mut rx = events.subscribe();

        store.add(f.parent, youtube("dQw4w9WgXcQ")).await.unwrap();
        match rx.recv().await.unwrap() {
            FolioEvent::ContentChanged(change) => {
                assert_eq!(change.entity, EntityKind::Media);
                assert_eq!(change.id, f.parent);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
