//! Media collections: validation, embed resolution, and the store that keeps
//! a sub-item's media in sync with the database and blob storage.

pub mod embed;
pub mod error;
pub mod input;
pub mod store;

pub use embed::{
    resolve, thumbnail_src, to_embed_url, youtube_thumbnail_url, youtube_video_id, EmbedResolver,
    EmbedTarget, DEFAULT_MAX_FILE_BYTES,
};
pub use error::MediaError;
pub use input::{FileUpload, MediaInput, ValidatedMedia, ValidationError};
pub use store::{MediaReferenceStore, SyncState};
