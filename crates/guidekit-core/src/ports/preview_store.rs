//! Preview resource port.
//!
//! Staged files get a preview URL so they can be played before upload.
//! The edit session owns these resources and must revoke them.

use crate::domain::SelectedFile;

/// Creates and revokes preview resources for staged files.
pub trait PreviewStore: Send + Sync {
    /// Create a preview resource and return its URL.
    fn create(&self, file: &SelectedFile) -> String;

    /// Release a preview resource. Revoking twice must be harmless.
    fn revoke(&self, url: &str);
}

/// Preview store for files already on the local filesystem.
///
/// Previews are plain `file://` URLs, so there is nothing to release.
#[derive(Debug, Clone, Default)]
pub struct LocalPreviewStore;

impl PreviewStore for LocalPreviewStore {
    fn create(&self, file: &SelectedFile) -> String {
        format!("file://{}", file.handle.path().display())
    }

    fn revoke(&self, url: &str) {
        tracing::trace!(url, "Local preview released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileHandle;

    #[test]
    fn test_local_preview_url() {
        let store = LocalPreviewStore;
        let file = SelectedFile::new(FileHandle::new("/music/a.mp3"), "a.mp3", 3);
        assert_eq!(store.create(&file), "file:///music/a.mp3");
        store.revoke("file:///music/a.mp3");
    }
}
