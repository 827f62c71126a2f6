//! Staging of locally selected files.
//!
//! A `MediaStagingArea` belongs to one edit session. It validates picked
//! files, creates their preview resources, tracks soft deletion and tags,
//! and produces the positionally aligned file/tag lists used at submit time.
//! Preview resources are released exactly once, by `release_all`.

use std::sync::Arc;

use uuid::Uuid;

use guidekit_core::ports::{DurationProbe, PreviewStore};
use guidekit_core::{
    ContentTypeCapability, FileHandle, MediaKey, SelectedFile, StagedFile, StagedStatus,
    StagingError,
};

use crate::playback::PlaybackCoordinator;

/// Outcome of staging several files at once.
#[derive(Debug, Default)]
pub struct StageReport {
    /// Files that were staged, in input order.
    pub staged: Vec<StagedFile>,
    /// Files that were rejected, in input order.
    pub rejected: Vec<StagingError>,
}

impl StageReport {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Files staged for upload during one edit session.
pub struct MediaStagingArea {
    capability: Arc<ContentTypeCapability>,
    max_upload_bytes: u64,
    previews: Arc<dyn PreviewStore>,
    files: Vec<StagedFile>,
}

impl MediaStagingArea {
    /// Create an empty staging area.
    pub fn new(
        capability: Arc<ContentTypeCapability>,
        max_upload_bytes: u64,
        previews: Arc<dyn PreviewStore>,
    ) -> Self {
        Self {
            capability,
            max_upload_bytes,
            previews,
            files: Vec::new(),
        }
    }

    /// Validate and stage one file.
    ///
    /// The file gets a fresh local id, a preview resource, the content
    /// type's initial tag and an unknown (0) duration.
    pub fn stage(&mut self, file: SelectedFile) -> Result<StagedFile, StagingError> {
        if file.byte_size > self.max_upload_bytes {
            tracing::info!(
                name = %file.display_name,
                size = file.byte_size,
                max = self.max_upload_bytes,
                "Rejected oversized file"
            );
            return Err(StagingError::UnsupportedSize {
                name: file.display_name,
                size: file.byte_size,
                max: self.max_upload_bytes,
            });
        }

        if !self
            .capability
            .accepts(&file.display_name, file.mime_type.as_deref())
        {
            tracing::info!(name = %file.display_name, "Rejected file type");
            return Err(StagingError::UnsupportedType {
                name: file.display_name,
                accepted: self.capability.accepted_file_types.clone(),
            });
        }

        let preview_url = self.previews.create(&file);
        let staged = StagedFile {
            local_id: Uuid::new_v4().to_string(),
            file: file.handle,
            preview_url,
            display_name: file.display_name,
            duration_seconds: 0.0,
            tag: self.capability.initial_tag(),
            status: StagedStatus::Active,
            byte_size: file.byte_size,
        };

        tracing::debug!(local_id = %staged.local_id, name = %staged.display_name, "File staged");
        self.files.push(staged.clone());
        Ok(staged)
    }

    /// Stage several files. A rejection never aborts the rest of the batch.
    pub fn stage_batch(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> StageReport {
        let mut report = StageReport::default();
        for file in files {
            match self.stage(file) {
                Ok(staged) => report.staged.push(staged),
                Err(e) => report.rejected.push(e),
            }
        }
        report
    }

    /// Staged files whose duration has not been decoded yet.
    pub fn pending_durations(&self) -> Vec<(String, FileHandle)> {
        self.files
            .iter()
            .filter(|f| f.duration_seconds <= 0.0)
            .map(|f| (f.local_id.clone(), f.file.clone()))
            .collect()
    }

    /// Record a decoded duration.
    ///
    /// Returns `false` when the file is gone (session released, or never
    /// staged here); the result is then discarded.
    pub fn apply_duration(&mut self, local_id: &str, seconds: f64) -> bool {
        if !(seconds.is_finite() && seconds > 0.0) {
            return false;
        }
        match self.find_mut(local_id) {
            Some(file) => {
                file.duration_seconds = seconds;
                true
            }
            None => false,
        }
    }

    /// Decode every pending duration with `probe`.
    ///
    /// Probe failures leave the duration at 0; the file stays active.
    /// Returns the number of durations applied.
    pub async fn probe_durations(&mut self, probe: &dyn DurationProbe) -> usize {
        let mut applied = 0;
        for (local_id, handle) in self.pending_durations() {
            match probe.probe(&handle).await {
                Ok(seconds) => {
                    if self.apply_duration(&local_id, seconds) {
                        applied += 1;
                    }
                }
                Err(e) => {
                    tracing::debug!(%local_id, error = %e, "Duration probe failed");
                }
            }
        }
        applied
    }

    /// Mark a file deleted, stopping its playback if it is playing.
    ///
    /// The file and its preview are kept so the deletion can be undone.
    pub fn soft_delete(
        &mut self,
        local_id: &str,
        playback: &PlaybackCoordinator,
    ) -> Result<(), StagingError> {
        let file = self.require_mut(local_id)?;
        file.status = StagedStatus::Deleted;
        playback.stop(&MediaKey::staged(local_id));
        Ok(())
    }

    /// Undo a soft deletion.
    pub fn restore(&mut self, local_id: &str) -> Result<(), StagingError> {
        self.require_mut(local_id)?.status = StagedStatus::Active;
        Ok(())
    }

    /// Change a file's tag.
    pub fn set_tag(&mut self, local_id: &str, tag: impl Into<String>) -> Result<(), StagingError> {
        self.require_mut(local_id)?.tag = tag.into();
        Ok(())
    }

    /// Revoke every preview resource and forget all files.
    ///
    /// Safe to call more than once.
    pub fn release_all(&mut self) {
        if self.files.is_empty() {
            return;
        }
        for file in self.files.drain(..) {
            self.previews.revoke(&file.preview_url);
        }
        tracing::debug!("Staged previews released");
    }

    /// Active files and their tags, positionally aligned.
    pub fn submission(&self) -> (Vec<FileHandle>, Vec<String>) {
        self.active()
            .map(|f| (f.file.clone(), f.tag.clone()))
            .unzip()
    }

    /// Active files in staging order.
    pub fn active(&self) -> impl Iterator<Item = &StagedFile> {
        self.files.iter().filter(|f| f.is_active())
    }

    /// Every staged file, including soft-deleted ones.
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn get(&self, local_id: &str) -> Option<&StagedFile> {
        self.files.iter().find(|f| f.local_id == local_id)
    }

    pub fn capability(&self) -> &ContentTypeCapability {
        &self.capability
    }

    /// Total bytes of active files.
    pub fn active_bytes(&self) -> u64 {
        self.active().map(|f| f.byte_size).sum()
    }

    fn find_mut(&mut self, local_id: &str) -> Option<&mut StagedFile> {
        self.files.iter_mut().find(|f| f.local_id == local_id)
    }

    fn require_mut(&mut self, local_id: &str) -> Result<&mut StagedFile, StagingError> {
        self.find_mut(local_id)
            .ok_or_else(|| StagingError::NotStaged {
                local_id: local_id.to_string(),
            })
    }
}

impl Drop for MediaStagingArea {
    fn drop(&mut self) {
        self.release_all();
    }
}
