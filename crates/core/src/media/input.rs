use bytes::Bytes;
use thiserror::Error;

use crate::model::{Media, MediaKind, MediaMetadata};
use crate::storage::extension_of;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("file is {size} bytes, the limit is {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("a file is required for file media")]
    MissingFile,

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// A file received from the operator that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileUpload {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.file_name)
    }
}

/// Unvalidated media descriptor as submitted by the admin UI.
#[derive(Debug, Clone)]
pub struct MediaInput {
    pub kind: MediaKind,
    pub url: Option<String>,
    pub file: Option<FileUpload>,
    pub metadata: MediaMetadata,
}

impl MediaInput {
    pub fn file(upload: FileUpload, metadata: MediaMetadata) -> Self {
        Self {
            kind: MediaKind::File,
            url: None,
            file: Some(upload),
            metadata,
        }
    }

    pub fn youtube(url: impl Into<String>, metadata: MediaMetadata) -> Self {
        Self {
            kind: MediaKind::Youtube,
            url: Some(url.into()),
            file: None,
            metadata,
        }
    }
}

/// Output of validation: either ready to append, or a file that must be
/// uploaded before it gets a URL.
#[derive(Debug, Clone)]
pub enum ValidatedMedia {
    PendingFile {
        upload: FileUpload,
        metadata: MediaMetadata,
    },
    Ready(Media),
}
