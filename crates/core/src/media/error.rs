use thiserror::Error;
use uuid::Uuid;

use super::input::ValidationError;
use crate::repo::StoreError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("sub-item not found: {0}")]
    ParentNotFound(Uuid),

    /// The blob store refused the upload; nothing was changed.
    #[error("upload failed: {0}")]
    Upload(#[source] StorageError),

    /// The write was rejected and the local view was resynchronised.
    #[error("persist failed: {0}")]
    Persist(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
