//! Multipart payload for content create/update requests.
//!
//! The payload is an ordered list of named parts. Repeated names
//! (`existingMedia`, `mediaFiles`, `tags`, `externalLinkUrls`) are paired
//! positionally by the backend, so part order is significant.

use serde::{Deserialize, Serialize};

use super::file::FileHandle;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_CATEGORY_ID: &str = "categoryId";
pub const FIELD_CATEGORY_NAME: &str = "categoryName";
pub const FIELD_PUBLISHED: &str = "published";
pub const FIELD_PREMIUM: &str = "premium";
pub const FIELD_EXISTING_MEDIA: &str = "existingMedia";
pub const FIELD_DELETED_MEDIA_INDICES: &str = "deletedMediaIndices";
pub const FIELD_MEDIA_FILES: &str = "mediaFiles";
pub const FIELD_TAGS: &str = "tags";
pub const FIELD_EXTERNAL_LINK_URLS: &str = "externalLinkUrls";

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadPart {
    /// Scalar or JSON-encoded text field.
    Text { name: String, value: String },
    /// Binary file streamed from disk.
    File {
        name: String,
        file: FileHandle,
        file_name: String,
        byte_size: u64,
    },
}

impl PayloadPart {
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Ordered multipart body plus the number of binary bytes it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPayload {
    parts: Vec<PayloadPart>,
}

impl ContentPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text part.
    pub fn text(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.parts.push(PayloadPart::Text {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Append a file part.
    pub fn file(
        &mut self,
        name: &str,
        file: FileHandle,
        file_name: impl Into<String>,
        byte_size: u64,
    ) -> &mut Self {
        self.parts.push(PayloadPart::File {
            name: name.to_string(),
            file,
            file_name: file_name.into(),
            byte_size,
        });
        self
    }

    pub fn parts(&self) -> &[PayloadPart] {
        &self.parts
    }

    /// All parts with the given name, in order.
    pub fn parts_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PayloadPart> + 'a {
        self.parts.iter().filter(move |p| p.name() == name)
    }

    /// Values of every text part with the given name, in order.
    pub fn text_values<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        self.parts_named(name)
            .filter_map(|p| match p {
                PayloadPart::Text { value, .. } => Some(value.as_str()),
                PayloadPart::File { .. } => None,
            })
            .collect()
    }

    /// Total size of the binary parts; 0 means a metadata-only request.
    pub fn total_bytes(&self) -> u64 {
        self.parts
            .iter()
            .map(|p| match p {
                PayloadPart::File { byte_size, .. } => *byte_size,
                PayloadPart::Text { .. } => 0,
            })
            .sum()
    }

    pub fn file_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, PayloadPart::File { .. }))
            .count()
    }
}
