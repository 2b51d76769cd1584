//! Blob storage for uploaded media.
//!
//! Provides a pluggable storage layer backed by:
//! - Local filesystem (served by the api under `/media`)
//! - Memory (tests)

mod backend;
mod key;
mod local;
mod memory;

pub use backend::{BlobStore, StorageError, StorageResult};
pub use key::{extension_of, BlobKey};
pub use local::LocalBlobStore;
pub use memory::{MemoryBlobStore, MEMORY_BASE_URL};
