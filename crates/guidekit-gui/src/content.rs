//! Content item operations: listing, submission through the upload
//! session, deletion and flag toggles.

use std::collections::HashSet;

use guidekit_core::ports::TransferOptions;
use guidekit_core::{
    ContentItem, ContentPayload, ContentTypeCapability, MediaKey, RepositoryError, UploadError,
};
use guidekit_media::{ContentForm, ExistingMediaRegistry, PlaybackCoordinator, build_payload};
use guidekit_upload::UploadSession;

use crate::deps::ManagerDeps;
use crate::editor::EditSession;
use crate::error::GuiError;
use crate::mutator::{OptimisticMutator, PendingMutation, require_saved};

/// Content operations handler.
pub struct ContentOps<'a> {
    deps: &'a ManagerDeps,
    list: &'a OptimisticMutator<ContentItem>,
    playback: &'a PlaybackCoordinator,
    upload: &'a UploadSession,
}

impl<'a> ContentOps<'a> {
    pub fn new(
        deps: &'a ManagerDeps,
        list: &'a OptimisticMutator<ContentItem>,
        playback: &'a PlaybackCoordinator,
        upload: &'a UploadSession,
    ) -> Self {
        Self {
            deps,
            list,
            playback,
            upload,
        }
    }

    /// Fetch the items of one category, replacing the local list.
    ///
    /// Playback entries of items that left the list are dropped; media of
    /// the new items is registered.
    pub async fn load(&self, category_id: &str) -> Result<Vec<ContentItem>, GuiError> {
        let items = self
            .deps
            .repository
            .list_content_by_category(self.deps.content_type(), category_id)
            .await?;

        let kept: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        self.playback.unregister_where(|key| match key {
            MediaKey::Item { item_id, .. } => !kept.contains(item_id.as_str()),
            MediaKey::Staged { .. } => false,
        });
        for item in &items {
            self.register_media(item);
        }

        tracing::debug!(category_id, count = items.len(), "Content loaded");
        self.list.replace_all(items.clone());
        Ok(items)
    }

    /// Submit an edit session as a create or an update.
    ///
    /// The list is updated optimistically while the upload runs. On success
    /// the session is closed; on failure it stays open so the user can retry.
    ///
    /// # Errors
    ///
    /// - `GuiError::Cancelled` if the session is closed or the user cancelled
    /// - `GuiError::Conflict` if another upload is in flight or the edited
    ///   item is still being created
    /// - `GuiError::ValidationFailed` for a missing title or category
    /// - `GuiError::Rejected` when the server refused; the list is rolled back
    pub async fn submit(&self, session: &EditSession) -> Result<ContentItem, GuiError> {
        if session.is_closed() {
            return Err(GuiError::Cancelled);
        }
        if self.upload.is_busy() {
            return Err(UploadError::Busy.into());
        }

        let form = session.form();
        if form.title.trim().is_empty() {
            return Err(GuiError::ValidationFailed("Title is required".to_string()));
        }
        if form.category_id.trim().is_empty() {
            return Err(GuiError::ValidationFailed(
                "Category is required".to_string(),
            ));
        }

        let editing_id = session
            .editing_id()
            .map(|id| self.saved_id(id))
            .transpose()?;
        let payload = session.payload()?;
        let total_bytes = payload.total_bytes();
        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();

        let mut guard = SettleOnDrop {
            list: self.list,
            pending: None,
        };
        let outcome = match editing_id.as_deref() {
            None => {
                let (pending, _) = self.list.begin_create(session.draft());
                guard.pending = Some(pending);
                self.upload
                    .run(total_bytes, |options| {
                        repository.create_content(content_type, payload, options)
                    })
                    .await
            }
            Some(id) => {
                // The item may belong to a category that is not loaded.
                guard.pending = self
                    .list
                    .begin_update(id, &session.patch())
                    .ok()
                    .map(|(pending, _)| pending);
                self.upload
                    .run(total_bytes, |options| {
                        repository.update_content(content_type, id, payload, options)
                    })
                    .await
            }
        };

        let busy = matches!(outcome, Err(UploadError::Busy));
        let result = match outcome {
            Ok(item) => Ok(item),
            Err(UploadError::Transfer(e)) => Err(e),
            Err(UploadError::Busy | UploadError::Cancelled) => Err(RepositoryError::Cancelled),
        };

        let settled = guard
            .pending
            .take()
            .map(|pending| self.list.settle(pending, result.clone().map(Some)));
        if busy {
            return Err(UploadError::Busy.into());
        }
        if let Some(settled) = settled {
            settled?;
        }
        let item = result?;

        if let Some(id) = editing_id.as_deref() {
            self.playback.unregister_where(|key| key.belongs_to(id));
        }
        self.register_media(&item);
        session.close();

        tracing::info!(id = %item.id, bytes = total_bytes, "Content submitted");
        Ok(item)
    }

    /// Abort the in-flight submission. Returns `false` if nothing was running.
    pub fn cancel_upload(&self) -> bool {
        self.upload.cancel()
    }

    pub async fn delete(&self, id: &str) -> Result<(), GuiError> {
        let saved = self.saved_id(id)?;
        let id = saved.as_str();
        if let Some(playing) = self.playback.playing_key() {
            if playing.belongs_to(id) {
                self.playback.stop(&playing);
            }
        }

        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        self.list
            .delete(id, |id| async move {
                repository.delete_content(content_type, &id).await
            })
            .await?;

        self.playback.unregister_where(|key| key.belongs_to(id));
        tracing::info!(%id, "Content deleted");
        Ok(())
    }

    pub async fn toggle_published(&self, id: &str) -> Result<ContentItem, GuiError> {
        let id = self.saved_id(id)?;
        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        let capability = &self.deps.capability;
        Ok(self
            .list
            .toggle_published(&id, |record| async move {
                let payload = metadata_payload(&record, capability)?;
                repository
                    .update_content(content_type, &record.id, payload, TransferOptions::plain())
                    .await
            })
            .await?)
    }

    pub async fn toggle_premium(&self, id: &str) -> Result<ContentItem, GuiError> {
        let id = self.saved_id(id)?;
        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        let capability = &self.deps.capability;
        Ok(self
            .list
            .toggle_premium(&id, |record| async move {
                let payload = metadata_payload(&record, capability)?;
                repository
                    .update_content(content_type, &record.id, payload, TransferOptions::plain())
                    .await
            })
            .await?)
    }

    /// Server id for `id`, refusing items whose create has not settled.
    fn saved_id(&self, id: &str) -> Result<String, GuiError> {
        let id = self.list.resolve_id(id);
        require_saved::<ContentItem>(&id)?;
        Ok(id)
    }

    fn register_media(&self, item: &ContentItem) {
        for index in 0..item.media.len() {
            self.playback.register(MediaKey::item(&item.id, index), 0.0);
        }
    }
}

/// Settles the optimistic record of a submission as cancelled when the
/// submitting future is dropped before the upload finished.
struct SettleOnDrop<'a> {
    list: &'a OptimisticMutator<ContentItem>,
    pending: Option<PendingMutation<ContentItem>>,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(id = pending.id(), "Submission dropped mid-upload");
            let _ = self.list.settle(pending, Err(RepositoryError::Cancelled));
        }
    }
}

/// Payload re-sending an item's fields and media unchanged.
fn metadata_payload(
    item: &ContentItem,
    capability: &ContentTypeCapability,
) -> Result<ContentPayload, RepositoryError> {
    let mut existing = ExistingMediaRegistry::new();
    existing.init_from_item(item);
    build_payload(
        &ContentForm::from_item(item),
        capability,
        Some(&existing),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidekit_core::domain::{FIELD_EXISTING_MEDIA, FIELD_PUBLISHED};
    use guidekit_core::{CapabilityFlags, MediaItem};

    #[test]
    fn test_metadata_payload_keeps_media_and_flags() {
        let item = ContentItem {
            id: "c1".to_string(),
            title: "Rain".to_string(),
            category_id: "cat".to_string(),
            published: true,
            media: vec![
                MediaItem::audio("https://cdn/a.mp3", 0),
                MediaItem::audio("https://cdn/b.mp3", 1),
            ],
            ..Default::default()
        };
        let capability = ContentTypeCapability {
            flags: CapabilityFlags::SUPPORTS_TAGGING,
            ..Default::default()
        };

        let payload = metadata_payload(&item, &capability).unwrap();

        assert_eq!(payload.text_values(FIELD_PUBLISHED), vec!["true"]);
        assert_eq!(payload.text_values(FIELD_EXISTING_MEDIA).len(), 2);
        assert_eq!(payload.file_count(), 0);
    }
}
