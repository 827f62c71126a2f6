//! Shadow tracking of server-confirmed media during an edit.
//!
//! Deletions and tag edits are recorded locally and only sent with the next
//! submission. Positions always refer to the item's media list as loaded, so
//! `deleted_indices` is meaningful to the backend.

use guidekit_core::{ContentItem, MediaItem, MediaKey, StagedFile, StagingError};

use crate::playback::PlaybackCoordinator;
use crate::staging::MediaStagingArea;

#[derive(Debug, Clone)]
struct ExistingSlot {
    media: MediaItem,
    deleted: bool,
}

/// One entry of the merged display list.
#[derive(Debug, Clone, PartialEq)]
pub enum MergedMedia {
    /// Retained server media, with its original position.
    Existing {
        index: usize,
        key: MediaKey,
        media: MediaItem,
    },
    /// Active staged file.
    Staged { key: MediaKey, file: StagedFile },
}

impl MergedMedia {
    pub fn key(&self) -> &MediaKey {
        match self {
            Self::Existing { key, .. } | Self::Staged { key, .. } => key,
        }
    }
}

/// Existing media of the item being edited.
#[derive(Debug, Default)]
pub struct ExistingMediaRegistry {
    item_id: Option<String>,
    slots: Vec<ExistingSlot>,
}

impl ExistingMediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a persisted item, clearing any previous deletion marks.
    ///
    /// Returns one playback key per media entry, in order.
    pub fn init_from_item(&mut self, item: &ContentItem) -> Vec<MediaKey> {
        self.item_id = Some(item.id.clone());
        self.slots = item
            .media
            .iter()
            .map(|media| ExistingSlot {
                media: media.clone(),
                deleted: false,
            })
            .collect();
        tracing::debug!(item_id = %item.id, count = self.slots.len(), "Existing media loaded");
        (0..self.slots.len())
            .map(|index| MediaKey::item(&item.id, index))
            .collect()
    }

    /// Mark the entry at `index` deleted, stopping it if it is playing.
    pub fn soft_delete(
        &mut self,
        index: usize,
        playback: &PlaybackCoordinator,
    ) -> Result<(), StagingError> {
        let key = self.key(index);
        self.slot_mut(index)?.deleted = true;
        if let Some(key) = key {
            playback.stop(&key);
        }
        Ok(())
    }

    /// Undo a soft deletion.
    pub fn restore(&mut self, index: usize) -> Result<(), StagingError> {
        self.slot_mut(index)?.deleted = false;
        Ok(())
    }

    /// Change the tag of the entry at `index`.
    pub fn set_tag(&mut self, index: usize, tag: impl Into<String>) -> Result<(), StagingError> {
        self.slot_mut(index)?.media.tag = Some(tag.into());
        Ok(())
    }

    /// Non-deleted media with their current tags, in original order.
    pub fn retained(&self) -> Vec<MediaItem> {
        self.slots
            .iter()
            .filter(|s| !s.deleted)
            .map(|s| s.media.clone())
            .collect()
    }

    /// Original positions of deleted entries, ascending.
    pub fn deleted_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.deleted)
            .map(|(i, _)| i)
            .collect()
    }

    /// `[existing non-deleted] ++ [staged active]`, the order used for
    /// display and for submission.
    pub fn merged_view(&self, staging: &MediaStagingArea) -> Vec<MergedMedia> {
        let existing = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.deleted)
            .filter_map(|(index, s)| {
                Some(MergedMedia::Existing {
                    index,
                    key: self.key(index)?,
                    media: s.media.clone(),
                })
            });
        let staged = staging.active().map(|f| MergedMedia::Staged {
            key: MediaKey::staged(&f.local_id),
            file: f.clone(),
        });
        existing.chain(staged).collect()
    }

    pub fn is_deleted(&self, index: usize) -> Option<bool> {
        self.slots.get(index).map(|s| s.deleted)
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn key(&self, index: usize) -> Option<MediaKey> {
        self.item_id
            .as_ref()
            .map(|id| MediaKey::item(id, index))
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut ExistingSlot, StagingError> {
        self.slots
            .get_mut(index)
            .ok_or(StagingError::UnknownIndex { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidekit_core::ports::{LocalPreviewStore, NoopEmitter, NoopTransport};
    use guidekit_core::{ContentTypeCapability, FileHandle, PlaybackState, SelectedFile};
    use std::sync::Arc;

    fn item() -> ContentItem {
        ContentItem {
            id: "item-1".to_string(),
            title: "Evening".to_string(),
            media: vec![
                MediaItem::audio("https://cdn/a.mp3", 0).with_tag("f"),
                MediaItem::audio("https://cdn/b.mp3", 1).with_tag("m"),
                MediaItem::audio("https://cdn/c.mp3", 2).with_tag("n"),
            ],
            ..Default::default()
        }
    }

    fn playback() -> PlaybackCoordinator {
        PlaybackCoordinator::new(Arc::new(NoopTransport), Arc::new(NoopEmitter::new()))
    }

    #[test]
    fn test_init_returns_keys() {
        let mut registry = ExistingMediaRegistry::new();
        let keys = registry.init_from_item(&item());
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[2], MediaKey::item("item-1", 2));
        assert_eq!(registry.item_id(), Some("item-1"));
    }

    #[test]
    fn test_delete_and_tag_edit() {
        let mut registry = ExistingMediaRegistry::new();
        registry.init_from_item(&item());
        let playback = playback();

        registry.soft_delete(1, &playback).unwrap();
        registry.set_tag(2, "male").unwrap();

        assert_eq!(registry.deleted_indices(), vec![1]);
        let retained = registry.retained();
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].url, "https://cdn/a.mp3");
        assert_eq!(retained[1].tag.as_deref(), Some("male"));

        registry.restore(1).unwrap();
        assert!(registry.deleted_indices().is_empty());
    }

    #[test]
    fn test_soft_delete_stops_playback() {
        let mut registry = ExistingMediaRegistry::new();
        let keys = registry.init_from_item(&item());
        let playback = playback();
        for key in &keys {
            playback.register(key.clone(), 30.0);
        }
        playback.request_play(&keys[0]);

        registry.soft_delete(0, &playback).unwrap();
        assert_eq!(playback.state(&keys[0]), Some(PlaybackState::Stopped));
    }

    #[test]
    fn test_unknown_index() {
        let mut registry = ExistingMediaRegistry::new();
        registry.init_from_item(&item());
        assert_eq!(
            registry.restore(7),
            Err(StagingError::UnknownIndex { index: 7 })
        );
    }

    #[test]
    fn test_reinit_clears_deletions() {
        let mut registry = ExistingMediaRegistry::new();
        registry.init_from_item(&item());
        registry.soft_delete(0, &playback()).unwrap();
        registry.init_from_item(&item());
        assert!(registry.deleted_indices().is_empty());
    }

    #[test]
    fn test_merged_view_order() {
        let mut registry = ExistingMediaRegistry::new();
        registry.init_from_item(&item());
        registry.soft_delete(0, &playback()).unwrap();

        let mut staging = MediaStagingArea::new(
            Arc::new(ContentTypeCapability::default()),
            u64::MAX,
            Arc::new(LocalPreviewStore),
        );
        let staged = staging
            .stage(SelectedFile::new(FileHandle::new("/tmp/new.mp3"), "new.mp3", 5))
            .unwrap();

        let merged = registry.merged_view(&staging);
        let keys: Vec<&MediaKey> = merged.iter().map(MergedMedia::key).collect();
        assert_eq!(
            keys,
            vec![
                &MediaKey::item("item-1", 1),
                &MediaKey::item("item-1", 2),
                &MediaKey::staged(&staged.local_id),
            ]
        );
    }
}
