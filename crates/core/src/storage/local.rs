//! Local filesystem blob store.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use super::backend::{key_below_base, BlobStore, StorageError, StorageResult};
use super::key::BlobKey;

/// Stores each object at `{root}/{key}` and serves it below `public_base_url`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &BlobKey) -> PathBuf {
        self.root.join(key.as_str())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, key: &BlobKey, data: Bytes) -> StorageResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await?;
        tracing::debug!(%key, bytes = data.len(), "stored blob");
        Ok(())
    }

    fn public_url(&self, key: &BlobKey) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_for_url(&self, url: &str) -> Option<BlobKey> {
        key_below_base(&self.public_base_url, url)
    }

    async fn remove(&self, keys: &[BlobKey]) -> StorageResult<()> {
        let mut failed = Vec::new();
        for key in keys {
            match fs::remove_file(self.path_for(key)).await {
                Ok(()) => tracing::debug!(%key, "removed blob"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(%key, error = %e, "failed to remove blob");
                    failed.push(key.to_string());
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(StorageError::PartialRemove(failed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[tokio::test]
    async fn upload_then_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path(), "http://localhost:3030/media/");

        let key = BlobKey::for_upload(Uuid::new_v4(), "photo.png", chrono::Utc::now());
        store.upload(&key, Bytes::from("png bytes")).await.unwrap();

        let on_disk = fs::read(temp_dir.path().join(key.as_str())).await.unwrap();
        assert_eq!(on_disk, b"png bytes");

        store.remove(std::slice::from_ref(&key)).await.unwrap();
        assert!(!temp_dir.path().join(key.as_str()).exists());
    }

    #[tokio::test]
    async fn public_url_maps_back_to_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path(), "http://localhost:3030/media/");

        let key = BlobKey::parse("abc/1.webp").unwrap();
        let url = store.public_url(&key);
        assert_eq!(url, "http://localhost:3030/media/abc/1.webp");
        assert_eq!(store.key_for_url(&url), Some(key));
        assert_eq!(store.key_for_url("https://youtu.be/dQw4w9WgXcQ"), None);
    }

    #[tokio::test]
    async fn removing_missing_object_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path(), "http://localhost/media");

        let key = BlobKey::parse("nobody/0.png").unwrap();
        store.remove(&[key]).await.unwrap();
    }

    #[tokio::test]
    async fn failed_removals_are_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path(), "http://localhost/media");

        // A directory in place of the object makes remove_file fail.
        let key = BlobKey::parse("parent/dir.png").unwrap();
        fs::create_dir_all(temp_dir.path().join(key.as_str()))
            .await
            .unwrap();

        let err = store.remove(&[key]).await.unwrap_err();
        match err {
            StorageError::PartialRemove(keys) => assert_eq!(keys, vec!["parent/dir.png"]),
            other => panic!("expected PartialRemove, got {other:?}"),
        }
    }
}
