//! Blob key handling.
//!
//! Uploaded media lives under keys of the form
//! `{parentId}/{unixMillis}-{suffix}.{ext}`, so every blob is namespaced by
//! the sub-item that references it.
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::backend::StorageError;

const FALLBACK_EXTENSION: &str = "bin";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Build a fresh key for a file uploaded to `parent_id` at `at`.
    pub fn for_upload(parent_id: Uuid, file_name: &str, at: DateTime<Utc>) -> Self {
        let ext = extension_of(file_name).unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        let suffix = Uuid::new_v4().simple().to_string();
        BlobKey(format!(
            "{parent_id}/{}-{}.{ext}",
            at.timestamp_millis(),
            &suffix[..8]
        ))
    }

    /// Parse a relative key, rejecting anything that could escape the store root.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let invalid = raw.is_empty()
            || raw.starts_with('/')
            || raw.contains('\\')
            || raw
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..");
        if invalid {
            return Err(StorageError::InvalidKey(raw.to_string()));
        }
        Ok(BlobKey(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sub-item this key is namespaced under, if the key follows the upload layout.
    pub fn parent_id(&self) -> Option<Uuid> {
        let (parent, _) = self.0.split_once('/')?;
        Uuid::parse_str(parent).ok()
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cased extension of a file name, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
