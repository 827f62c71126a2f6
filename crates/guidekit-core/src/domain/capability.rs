//! Content-type capability descriptor.
//!
//! Supplied by configuration and consumed read-only: it tells the
//! coordinator which staging and registry features a content type exposes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Feature switches of a content type.
    ///
    /// Absence means the feature is hidden for that content type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct CapabilityFlags: u32 {
        /// Media entries carry a tag (e.g. voice gender).
        const SUPPORTS_TAGGING       = 0b0000_0001;

        /// Items may reference externally hosted media by URL.
        const SUPPORTS_EXTERNAL_LINK = 0b0000_0010;
    }
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for CapabilityFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CapabilityFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

/// Read-only description of what a content type supports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeCapability {
    /// Backend key of the content type (path segment for repository calls).
    pub content_type: String,
    /// Feature flags.
    #[serde(default)]
    pub flags: CapabilityFlags,
    /// Accept list in `<input accept>` syntax, e.g. `audio/*,.m4a`.
    /// Empty accepts everything.
    #[serde(default)]
    pub accepted_file_types: String,
    /// Tag given to newly staged files when tagging is supported.
    #[serde(default)]
    pub default_tag: Option<String>,
    pub category_label: String,
    pub item_label: String,
    pub add_item_label: String,
}

impl ContentTypeCapability {
    /// Whether media entries of this type carry tags.
    pub const fn supports_tagging(&self) -> bool {
        self.flags.contains(CapabilityFlags::SUPPORTS_TAGGING)
    }

    /// Whether items may reference external media links.
    pub const fn supports_external_link(&self) -> bool {
        self.flags.contains(CapabilityFlags::SUPPORTS_EXTERNAL_LINK)
    }

    /// Tag assigned to a freshly staged file.
    pub fn initial_tag(&self) -> String {
        if self.supports_tagging() {
            self.default_tag.clone().unwrap_or_default()
        } else {
            String::new()
        }
    }

    /// Check a file against the accept list.
    ///
    /// Tokens are comma separated: `.ext` matches the file extension,
    /// `type/*` matches a MIME prefix, anything else matches the MIME type
    /// exactly. All comparisons are case-insensitive.
    pub fn accepts(&self, file_name: &str, mime_type: Option<&str>) -> bool {
        let tokens: Vec<String> = self
            .accepted_file_types
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return true;
        }

        let name = file_name.to_lowercase();
        let mime = mime_type.map(str::to_lowercase);

        tokens.iter().any(|token| {
            if token.starts_with('.') {
                name.ends_with(token.as_str())
            } else if let Some(prefix) = token.strip_suffix("/*") {
                mime.as_deref()
                    .is_some_and(|m| m.split('/').next() == Some(prefix))
            } else {
                mime.as_deref() == Some(token.as_str())
            }
        })
    }
}
