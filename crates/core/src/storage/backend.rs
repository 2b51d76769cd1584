//! Blob storage trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::key::BlobKey;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("failed to remove {} object(s): {}", .0.len(), .0.join(", "))]
    PartialRemove(Vec<String>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Object storage for uploaded media.
///
/// Every stored object is reachable at a public URL derived from its key,
/// and the mapping can be inverted for URLs the store itself handed out.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous object.
    async fn upload(&self, key: &BlobKey, data: Bytes) -> StorageResult<()>;

    /// Public URL an uploaded object is served from.
    fn public_url(&self, key: &BlobKey) -> String;

    /// Recover the key of a URL produced by [`BlobStore::public_url`].
    /// URLs hosted elsewhere yield `None`.
    fn key_for_url(&self, url: &str) -> Option<BlobKey>;

    /// Remove every key. Missing objects count as removed; keys that could
    /// not be removed are reported through [`StorageError::PartialRemove`].
    async fn remove(&self, keys: &[BlobKey]) -> StorageResult<()>;
}

/// Shared helper for stores that serve keys below a fixed base URL.
pub(crate) fn key_below_base(base_url: &str, url: &str) -> Option<BlobKey> {
    let rest = url.strip_prefix(base_url.trim_end_matches('/'))?;
    let rest = rest.strip_prefix('/')?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    BlobKey::parse(rest).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_below_base_strips_prefix_and_query() {
        let key = key_below_base("https://cdn.test/media/", "https://cdn.test/media/p/1.png?v=2");
        assert_eq!(key.map(|k| k.to_string()), Some("p/1.png".to_string()));
    }

    #[test]
    fn key_below_base_ignores_foreign_urls() {
        assert!(key_below_base("https://cdn.test/media", "https://youtu.be/abc").is_none());
        assert!(key_below_base("https://cdn.test/media", "https://cdn.test/mediafoo/x").is_none());
    }
}
