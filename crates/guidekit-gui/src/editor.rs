//! Edit sessions: one open create/edit form with its staged files and the
//! shadow state of the item's existing media.
//!
//! A session owns its staged files' preview resources and releases them
//! when closed (explicitly, after a successful submit, or on drop). Async
//! work that finishes after `close` finds the session closed and does
//! nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use guidekit_core::ports::{DurationProbe, PreviewStore};
use guidekit_core::{
    ContentItem, ContentPatch, ContentPayload, ContentTypeCapability, CoordinatorError, MediaKey,
    SelectedFile,
};
use guidekit_media::{
    ContentForm, ExistingMediaRegistry, MediaStagingArea, MergedMedia, PlaybackCoordinator,
    StageReport, build_payload,
};

struct EditorState {
    form: ContentForm,
    staging: MediaStagingArea,
    existing: ExistingMediaRegistry,
}

/// An open create or edit form.
pub struct EditSession {
    editing_id: Option<String>,
    capability: Arc<ContentTypeCapability>,
    playback: Arc<PlaybackCoordinator>,
    state: Mutex<EditorState>,
    closed: AtomicBool,
}

impl EditSession {
    /// Open a session. `item` is the record being edited, `None` to create.
    pub fn open(
        capability: Arc<ContentTypeCapability>,
        max_upload_bytes: u64,
        previews: Arc<dyn PreviewStore>,
        playback: Arc<PlaybackCoordinator>,
        item: Option<&ContentItem>,
    ) -> Self {
        let mut existing = ExistingMediaRegistry::new();
        let form = match item {
            Some(item) => {
                for key in existing.init_from_item(item) {
                    playback.register(key, 0.0);
                }
                ContentForm::from_item(item)
            }
            None => ContentForm::default(),
        };
        let staging = MediaStagingArea::new(Arc::clone(&capability), max_upload_bytes, previews);

        tracing::debug!(editing = ?item.map(|i| i.id.as_str()), "Edit session opened");
        Self {
            editing_id: item.map(|i| i.id.clone()),
            capability,
            playback,
            state: Mutex::new(EditorState {
                form,
                staging,
                existing,
            }),
            closed: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state of an open session.
    fn open_state(&self) -> Result<MutexGuard<'_, EditorState>, CoordinatorError> {
        if self.is_closed() {
            return Err(CoordinatorError::SessionClosed);
        }
        Ok(self.state())
    }

    /// Id of the item being edited; `None` when creating.
    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn capability(&self) -> &ContentTypeCapability {
        &self.capability
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // =========================================================================
    // Form
    // =========================================================================

    pub fn form(&self) -> ContentForm {
        self.state().form.clone()
    }

    /// Edit the form fields in place.
    pub fn update_form(&self, edit: impl FnOnce(&mut ContentForm)) -> Result<(), CoordinatorError> {
        edit(&mut self.open_state()?.form);
        Ok(())
    }

    // =========================================================================
    // Staged files
    // =========================================================================

    /// Stage picked files. Rejections are reported per file.
    pub fn stage_files(
        &self,
        files: impl IntoIterator<Item = SelectedFile>,
    ) -> Result<StageReport, CoordinatorError> {
        let report = self.open_state()?.staging.stage_batch(files);
        for staged in &report.staged {
            self.playback
                .register(MediaKey::staged(&staged.local_id), staged.duration_seconds);
        }
        Ok(report)
    }

    /// Decode durations of staged files, best-effort.
    ///
    /// The probe runs without holding the session lock; results arriving
    /// after `close` are dropped.
    pub async fn probe_durations(&self, probe: &dyn DurationProbe) -> usize {
        let Ok(pending) = self.open_state().map(|s| s.staging.pending_durations()) else {
            return 0;
        };

        let mut applied = 0;
        for (local_id, handle) in pending {
            let seconds = match probe.probe(&handle).await {
                Ok(seconds) => seconds,
                Err(e) => {
                    tracing::debug!(%local_id, error = %e, "Duration probe failed");
                    continue;
                }
            };
            let Ok(mut state) = self.open_state() else {
                tracing::debug!(%local_id, "Session closed before duration arrived");
                return applied;
            };
            if state.staging.apply_duration(&local_id, seconds) {
                drop(state);
                self.playback.register(MediaKey::staged(&local_id), seconds);
                applied += 1;
            }
        }
        applied
    }

    pub fn soft_delete_staged(&self, local_id: &str) -> Result<(), CoordinatorError> {
        Ok(self
            .open_state()?
            .staging
            .soft_delete(local_id, &self.playback)?)
    }

    pub fn restore_staged(&self, local_id: &str) -> Result<(), CoordinatorError> {
        Ok(self.open_state()?.staging.restore(local_id)?)
    }

    pub fn set_staged_tag(&self, local_id: &str, tag: &str) -> Result<(), CoordinatorError> {
        Ok(self.open_state()?.staging.set_tag(local_id, tag)?)
    }

    // =========================================================================
    // Existing media
    // =========================================================================

    pub fn soft_delete_existing(&self, index: usize) -> Result<(), CoordinatorError> {
        Ok(self
            .open_state()?
            .existing
            .soft_delete(index, &self.playback)?)
    }

    pub fn restore_existing(&self, index: usize) -> Result<(), CoordinatorError> {
        Ok(self.open_state()?.existing.restore(index)?)
    }

    pub fn set_existing_tag(&self, index: usize, tag: &str) -> Result<(), CoordinatorError> {
        Ok(self.open_state()?.existing.set_tag(index, tag)?)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// `[existing non-deleted] ++ [staged active]`.
    pub fn merged_view(&self) -> Vec<MergedMedia> {
        let state = self.state();
        state.existing.merged_view(&state.staging)
    }

    /// Build the multipart payload for the current state.
    pub fn payload(&self) -> Result<ContentPayload, CoordinatorError> {
        let state = self.open_state()?;
        let existing = self.editing_id.is_some().then_some(&state.existing);
        Ok(build_payload(
            &state.form,
            &self.capability,
            existing,
            Some(&state.staging),
        )?)
    }

    /// Optimistic record for a create.
    pub fn draft(&self) -> ContentItem {
        let state = self.state();
        let form = &state.form;
        ContentItem {
            id: String::new(),
            title: form.title.trim().to_string(),
            description: form.description.trim().to_string(),
            category_id: form.category_id.clone(),
            category_name: form.category_name.clone(),
            published: form.published,
            premium: form.premium,
            media: Vec::new(),
        }
    }

    /// Optimistic patch for an update. Media is left to the server.
    pub fn patch(&self) -> ContentPatch {
        let state = self.state();
        let form = &state.form;
        ContentPatch {
            title: Some(form.title.trim().to_string()),
            description: Some(form.description.trim().to_string()),
            category_id: Some(form.category_id.clone()),
            category_name: Some(form.category_name.clone()),
            published: Some(form.published),
            premium: Some(form.premium),
            media: Some(state.existing.retained()),
        }
    }

    /// Close the session: stop its playback and release staged previews.
    ///
    /// Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let staged_keys: Vec<MediaKey> = {
            let mut state = self.state();
            let keys = state
                .staging
                .files()
                .iter()
                .map(|f| MediaKey::staged(&f.local_id))
                .collect();
            state.staging.release_all();
            keys
        };
        for key in &staged_keys {
            self.playback.unregister(key);
        }
        if let (Some(id), Some(playing)) = (&self.editing_id, self.playback.playing_key()) {
            if playing.belongs_to(id) {
                self.playback.stop(&playing);
            }
        }
        tracing::debug!(editing = ?self.editing_id, "Edit session closed");
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        self.close();
    }
}
