pub mod media;
pub mod section;
pub mod sub_item;
pub mod validate;

pub use media::{
    reconcile, stored_media_items, Media, MediaCollection, MediaColumns, MediaKind,
    MediaMetadata, StoredMediaItem,
};
pub use section::{NewSection, Section, SectionIcon, SectionPatch};
pub use sub_item::{NewSubItem, SubItem, SubItemPatch, SubItemRow};
