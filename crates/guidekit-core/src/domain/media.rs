//! Media domain types: server-confirmed media entries and playback keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a persisted media entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    /// Uploaded audio file served by the backend.
    Audio,
    /// Media hosted elsewhere and referenced by URL.
    ExternalLink,
}

/// A media entry already persisted and attached to a content item.
///
/// Immutable once persisted, except for `tag` while an edit session
/// shadows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Audio or external link.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Where the media can be fetched from.
    pub url: String,
    /// Optional tag (e.g. voice gender).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Position of the entry within its content item.
    pub sequence_index: u32,
}

impl MediaItem {
    /// Create an audio entry without a tag.
    pub fn audio(url: impl Into<String>, sequence_index: u32) -> Self {
        Self {
            kind: MediaKind::Audio,
            url: url.into(),
            tag: None,
            sequence_index,
        }
    }

    /// Create an external-link entry without a tag.
    pub fn external_link(url: impl Into<String>, sequence_index: u32) -> Self {
        Self {
            kind: MediaKind::ExternalLink,
            url: url.into(),
            tag: None,
            sequence_index,
        }
    }

    /// Builder-style tag setter.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Long tag spellings the backend stores in short form.
const TAG_SHORT_FORMS: &[(&str, &str)] = &[("male", "m"), ("female", "f"), ("neutral", "n")];

/// Normalize a tag to the backend's short form.
///
/// Known long spellings (`male`, `female`, `neutral`, any case) map to their
/// one-letter form; anything else is trimmed and lowercased.
pub fn normalize_tag(tag: &str) -> String {
    let lowered = tag.trim().to_lowercase();
    match TAG_SHORT_FORMS.iter().find(|(long, _)| *long == lowered) {
        Some((_, short)) => (*short).to_string(),
        None => lowered,
    }
}

/// Structural identity of a playable media handle.
///
/// Persisted media is keyed by owning item and position, staged files by
/// their session-local id, so keys never collide across lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaKey {
    /// Media attached to a persisted content item.
    Item {
        /// Owning content item id.
        item_id: String,
        /// Position in the item's media list.
        index: usize,
    },
    /// A locally staged file that has not been uploaded.
    Staged {
        /// Session-local identifier of the staged file.
        local_id: String,
    },
}

impl MediaKey {
    /// Key for media `index` of content item `item_id`.
    pub fn item(item_id: impl Into<String>, index: usize) -> Self {
        Self::Item {
            item_id: item_id.into(),
            index,
        }
    }

    /// Key for a staged file.
    pub fn staged(local_id: impl Into<String>) -> Self {
        Self::Staged {
            local_id: local_id.into(),
        }
    }

    /// Whether this key belongs to the given content item.
    pub fn belongs_to(&self, id: &str) -> bool {
        matches!(self, Self::Item { item_id, .. } if item_id == id)
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item { item_id, index } => write!(f, "{item_id}#{index}"),
            Self::Staged { local_id } => write!(f, "staged:{local_id}"),
        }
    }
}
