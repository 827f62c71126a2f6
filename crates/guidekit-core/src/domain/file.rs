//! Locally selected and staged files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque handle to a file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileHandle(PathBuf);

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Extension → MIME table for the audio formats the managers deal with.
const AUDIO_MIME_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("flac", "audio/flac"),
    ("webm", "audio/webm"),
];

/// Guess a MIME type from a file name's extension.
pub fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
    AUDIO_MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// A file picked by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub handle: FileHandle,
    pub display_name: String,
    pub byte_size: u64,
    pub mime_type: Option<String>,
}

impl SelectedFile {
    /// Describe a file without touching the filesystem.
    pub fn new(handle: FileHandle, display_name: impl Into<String>, byte_size: u64) -> Self {
        let display_name = display_name.into();
        let mime_type = mime_from_name(&display_name).map(str::to_string);
        Self {
            handle,
            display_name,
            byte_size,
            mime_type,
        }
    }

    /// Describe a file on disk, reading its size from metadata.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(
            FileHandle::new(path),
            display_name,
            metadata.len(),
        ))
    }
}

/// Whether a staged file takes part in the next submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagedStatus {
    Active,
    /// Soft-deleted; reversible until the session ends.
    Deleted,
}

/// A locally selected file not yet submitted to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFile {
    /// Unique within the editing session.
    pub local_id: String,
    pub file: FileHandle,
    /// Preview resource owned by the session, revoked on release.
    pub preview_url: String,
    pub display_name: String,
    /// Decoded duration; 0 until probed or when probing failed.
    pub duration_seconds: f64,
    pub tag: String,
    pub status: StagedStatus,
    pub byte_size: u64,
}

impl StagedFile {
    pub fn is_active(&self) -> bool {
        self.status == StagedStatus::Active
    }
}
