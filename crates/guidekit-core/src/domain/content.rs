//! Categories and content items, plus the `Entity` abstraction the
//! optimistic mutator is generic over.

use serde::{Deserialize, Serialize};

use super::media::MediaItem;

/// A record kept in an optimistically-mutated in-memory list.
///
/// Implementors describe how to identify, patch and sort themselves so a
/// single rollback law can serve every entity shape.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Partial update applied by `update`.
    type Patch: Clone + Send + Sync + 'static;

    /// Human-readable entity name used in user-facing messages.
    const LABEL: &'static str;

    /// Current identifier (temporary or server-assigned).
    fn id(&self) -> &str;

    /// Replace the identifier (used for temporary ids).
    fn set_id(&mut self, id: String);

    /// Apply a partial update in place.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Natural display key used when a record has to be reinserted.
    fn sort_key(&self) -> String;

    /// Whether the record is published.
    fn is_published(&self) -> bool;

    /// Whether the record is premium-only.
    fn is_premium(&self) -> bool;

    /// Single-field patch setting `published`.
    fn published_patch(value: bool) -> Self::Patch;

    /// Single-field patch setting `premium`.
    fn premium_patch(value: bool) -> Self::Patch;
}

/// A category grouping content items of one content type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub premium: bool,
}

impl Category {
    /// Create an unpublished, free category draft (id assigned later).
    pub fn draft(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
            published: false,
            premium: false,
        }
    }
}

/// Partial category update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
    pub premium: Option<bool>,
}

impl Entity for Category {
    type Patch = CategoryPatch;

    const LABEL: &'static str = "category";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &CategoryPatch) {
        if let Some(ref name) = patch.name {
            self.name.clone_from(name);
        }
        if let Some(ref description) = patch.description {
            self.description.clone_from(description);
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        if let Some(premium) = patch.premium {
            self.premium = premium;
        }
    }

    fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }

    fn is_published(&self) -> bool {
        self.published
    }

    fn is_premium(&self) -> bool {
        self.premium
    }

    fn published_patch(value: bool) -> CategoryPatch {
        CategoryPatch {
            published: Some(value),
            ..CategoryPatch::default()
        }
    }

    fn premium_patch(value: bool) -> CategoryPatch {
        CategoryPatch {
            premium: Some(value),
            ..CategoryPatch::default()
        }
    }
}

/// A guided content item with its ordered media.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

/// Partial content item update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub published: Option<bool>,
    pub premium: Option<bool>,
    pub media: Option<Vec<MediaItem>>,
}

impl Entity for ContentItem {
    type Patch = ContentPatch;

    const LABEL: &'static str = "content item";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &ContentPatch) {
        if let Some(ref title) = patch.title {
            self.title.clone_from(title);
        }
        if let Some(ref description) = patch.description {
            self.description.clone_from(description);
        }
        if let Some(ref category_id) = patch.category_id {
            self.category_id.clone_from(category_id);
        }
        if let Some(ref category_name) = patch.category_name {
            self.category_name.clone_from(category_name);
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        if let Some(premium) = patch.premium {
            self.premium = premium;
        }
        if let Some(ref media) = patch.media {
            self.media.clone_from(media);
        }
    }

    fn sort_key(&self) -> String {
        self.title.to_lowercase()
    }

    fn is_published(&self) -> bool {
        self.published
    }

    fn is_premium(&self) -> bool {
        self.premium
    }

    fn published_patch(value: bool) -> ContentPatch {
        ContentPatch {
            published: Some(value),
            ..ContentPatch::default()
        }
    }

    fn premium_patch(value: bool) -> ContentPatch {
        ContentPatch {
            premium: Some(value),
            ..ContentPatch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_patch_only_touches_set_fields() {
        let mut category = Category {
            id: "c1".to_string(),
            name: "Sleep".to_string(),
            description: "Wind down".to_string(),
            published: false,
            premium: true,
        };
        category.apply_patch(&Category::published_patch(true));

        assert!(category.published);
        assert!(category.premium);
        assert_eq!(category.name, "Sleep");
    }

    #[test]
    fn test_content_patch_replaces_media() {
        let mut item = ContentItem {
            id: "i1".to_string(),
            title: "Body scan".to_string(),
            media: vec![MediaItem::audio("a.mp3", 0)],
            ..ContentItem::default()
        };
        let patch = ContentPatch {
            title: Some("Body scan (long)".to_string()),
            media: Some(vec![]),
            ..ContentPatch::default()
        };
        item.apply_patch(&patch);

        assert_eq!(item.title, "Body scan (long)");
        assert!(item.media.is_empty());
    }

    #[test]
    fn test_sort_keys_are_case_insensitive() {
        let a = Category::draft("alpha", "");
        let b = Category::draft("Beta", "");
        assert!(a.sort_key() < b.sort_key());
    }
}
