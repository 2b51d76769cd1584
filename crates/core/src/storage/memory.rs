//! In-memory blob store with switchable failures, used in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::backend::{key_below_base, BlobStore, StorageError, StorageResult};
use super::key::BlobKey;

pub const MEMORY_BASE_URL: &str = "memory://media";

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
    reject_uploads: AtomicBool,
    fail_removals: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following upload fail as if rejected by storage policy.
    pub fn reject_uploads(&self, reject: bool) {
        self.reject_uploads.store(reject, Ordering::SeqCst);
    }

    /// Make every following removal fail.
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &BlobKey) -> bool {
        self.lock().contains_key(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &BlobKey, data: Bytes) -> StorageResult<()> {
        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected(format!("policy rejected {key}")));
        }
        self.lock().insert(key.to_string(), data);
        Ok(())
    }

    fn public_url(&self, key: &BlobKey) -> String {
        format!("{MEMORY_BASE_URL}/{key}")
    }

    fn key_for_url(&self, url: &str) -> Option<BlobKey> {
        key_below_base(MEMORY_BASE_URL, url)
    }

    async fn remove(&self, keys: &[BlobKey]) -> StorageResult<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StorageError::PartialRemove(
                keys.iter().map(ToString::to_string).collect(),
            ));
        }
        let mut objects = self.lock();
        for key in keys {
            objects.remove(key.as_str());
        }
        Ok(())
    }
}
