//! Multipart payload assembly for create and update submissions.
//!
//! Part order:
//!
//! 1. scalar fields (`title`, `description`, `categoryId`, `categoryName`,
//!    `published`, `premium`)
//! 2. one `existingMedia` JSON part per retained server media
//! 3. `deletedMediaIndices` JSON array, omitted when empty
//! 4. one `mediaFiles` part per active staged file
//! 5. one `tags` part per active staged file, when the type supports tagging
//! 6. one `externalLinkUrls` part per link, when the type supports links
//!
//! Tags are sent in the backend's short form (see `normalize_tag`).

use serde::{Deserialize, Serialize};

use guidekit_core::domain::{
    FIELD_CATEGORY_ID, FIELD_CATEGORY_NAME, FIELD_DELETED_MEDIA_INDICES, FIELD_DESCRIPTION,
    FIELD_EXISTING_MEDIA, FIELD_EXTERNAL_LINK_URLS, FIELD_MEDIA_FILES, FIELD_PREMIUM,
    FIELD_PUBLISHED, FIELD_TAGS, FIELD_TITLE,
};
use guidekit_core::{
    ContentItem, ContentPayload, ContentTypeCapability, RepositoryError, normalize_tag,
};

use crate::existing::ExistingMediaRegistry;
use crate::staging::MediaStagingArea;

/// Scalar fields of the item being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentForm {
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub category_name: String,
    pub published: bool,
    pub premium: bool,
    /// Externally hosted media, ignored unless the content type supports links.
    #[serde(default)]
    pub external_link_urls: Vec<String>,
}

impl ContentForm {
    /// Prefill the form from a persisted item.
    pub fn from_item(item: &ContentItem) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            category_id: item.category_id.clone(),
            category_name: item.category_name.clone(),
            published: item.published,
            premium: item.premium,
            external_link_urls: Vec::new(),
        }
    }
}

/// Build the payload for a submission.
///
/// `existing` is `None` when creating a new item; `staging` is `None` for
/// metadata-only updates such as publish toggles.
pub fn build_payload(
    form: &ContentForm,
    capability: &ContentTypeCapability,
    existing: Option<&ExistingMediaRegistry>,
    staging: Option<&MediaStagingArea>,
) -> Result<ContentPayload, RepositoryError> {
    let tagging = capability.supports_tagging();
    let mut payload = ContentPayload::new();

    payload
        .text(FIELD_TITLE, form.title.trim())
        .text(FIELD_DESCRIPTION, form.description.trim())
        .text(FIELD_CATEGORY_ID, form.category_id.as_str())
        .text(FIELD_CATEGORY_NAME, form.category_name.as_str())
        .text(FIELD_PUBLISHED, form.published.to_string())
        .text(FIELD_PREMIUM, form.premium.to_string());

    if let Some(existing) = existing {
        for mut media in existing.retained() {
            media.tag = media.tag.as_deref().map(normalize_tag);
            let json = serde_json::to_string(&media)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            payload.text(FIELD_EXISTING_MEDIA, json);
        }

        let deleted = existing.deleted_indices();
        if !deleted.is_empty() {
            let json = serde_json::to_string(&deleted)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            payload.text(FIELD_DELETED_MEDIA_INDICES, json);
        }
    }

    if let Some(staging) = staging {
        for file in staging.active() {
            payload.file(
                FIELD_MEDIA_FILES,
                file.file.clone(),
                file.display_name.as_str(),
                file.byte_size,
            );
        }
        if tagging {
            for file in staging.active() {
                payload.text(FIELD_TAGS, normalize_tag(&file.tag));
            }
        }
    }

    if capability.supports_external_link() {
        for url in form
            .external_link_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
        {
            payload.text(FIELD_EXTERNAL_LINK_URLS, url);
        }
    }

    tracing::debug!(
        files = payload.file_count(),
        bytes = payload.total_bytes(),
        "Submission payload built"
    );
    Ok(payload)
}
