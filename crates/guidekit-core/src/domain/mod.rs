//! Core domain types.
//!
//! Pure data types with no I/O beyond optional filesystem metadata reads.

mod capability;
mod content;
mod file;
mod media;
mod payload;

pub use capability::{CapabilityFlags, ContentTypeCapability};
pub use content::{Category, CategoryPatch, ContentItem, ContentPatch, Entity};
pub use file::{FileHandle, SelectedFile, StagedFile, StagedStatus, mime_from_name};
pub use media::{MediaItem, MediaKey, MediaKind, normalize_tag};
pub use payload::{
    ContentPayload, FIELD_CATEGORY_ID, FIELD_CATEGORY_NAME, FIELD_DELETED_MEDIA_INDICES,
    FIELD_DESCRIPTION, FIELD_EXISTING_MEDIA, FIELD_EXTERNAL_LINK_URLS, FIELD_MEDIA_FILES,
    FIELD_PREMIUM, FIELD_PUBLISHED, FIELD_TAGS, FIELD_TITLE, PayloadPart,
};
