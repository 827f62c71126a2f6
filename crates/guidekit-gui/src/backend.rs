//! `ContentManager`: the facade rendering layers delegate to.

use std::sync::Arc;

use tokio::sync::watch;

use guidekit_core::{
    Category, CategoryPatch, ContentItem, ContentTypeCapability, Settings, UploadSnapshot,
    validate_settings,
};
use guidekit_media::PlaybackCoordinator;
use guidekit_upload::{UploadConfig, UploadSession};

use crate::categories::CategoryOps;
use crate::content::ContentOps;
use crate::deps::ManagerDeps;
use crate::editor::EditSession;
use crate::error::GuiError;
use crate::mutator::OptimisticMutator;

/// Coordinator for one content type's manager screen.
///
/// Owns the category and content lists, the playback coordinator shared by
/// every list and editor, and the single upload session.
pub struct ContentManager {
    deps: ManagerDeps,
    categories: OptimisticMutator<Category>,
    content: OptimisticMutator<ContentItem>,
    playback: Arc<PlaybackCoordinator>,
    upload: UploadSession,
}

impl ContentManager {
    /// Create a manager from injected dependencies.
    ///
    /// # Errors
    ///
    /// Returns `GuiError::ValidationFailed` if the settings are invalid.
    pub fn new(deps: ManagerDeps) -> Result<Self, GuiError> {
        validate_settings(&deps.settings)?;

        let playback = Arc::new(PlaybackCoordinator::new(
            Arc::clone(&deps.transport),
            Arc::clone(&deps.emitter),
        ));
        let upload = UploadSession::new(
            UploadConfig::from_settings(&deps.settings),
            Arc::clone(&deps.emitter),
        );
        tracing::debug!(
            content_type = %deps.capability.content_type,
            upload_session = upload.id(),
            "Content manager created"
        );

        Ok(Self {
            categories: OptimisticMutator::new(Arc::clone(&deps.emitter)),
            content: OptimisticMutator::new(Arc::clone(&deps.emitter)),
            playback,
            upload,
            deps,
        })
    }

    fn category_ops(&self) -> CategoryOps<'_> {
        CategoryOps::new(&self.deps, &self.categories)
    }

    fn content_ops(&self) -> ContentOps<'_> {
        ContentOps::new(&self.deps, &self.content, &self.playback, &self.upload)
    }

    pub fn capability(&self) -> &ContentTypeCapability {
        &self.deps.capability
    }

    pub const fn settings(&self) -> &Settings {
        &self.deps.settings
    }

    // =========================================================================
    // Category operations
    // =========================================================================

    pub fn categories(&self) -> Vec<Category> {
        self.categories.records()
    }

    pub async fn load_categories(&self) -> Result<Vec<Category>, GuiError> {
        self.category_ops().load().await
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Category, GuiError> {
        self.category_ops().create(name, description).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        patch: &CategoryPatch,
    ) -> Result<Category, GuiError> {
        self.category_ops().update(id, patch).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), GuiError> {
        self.category_ops().delete(id).await
    }

    pub async fn toggle_category_published(&self, id: &str) -> Result<Category, GuiError> {
        self.category_ops().toggle_published(id).await
    }

    pub async fn toggle_category_premium(&self, id: &str) -> Result<Category, GuiError> {
        self.category_ops().toggle_premium(id).await
    }

    // =========================================================================
    // Content operations
    // =========================================================================

    pub fn content(&self) -> Vec<ContentItem> {
        self.content.records()
    }

    pub async fn load_content(&self, category_id: &str) -> Result<Vec<ContentItem>, GuiError> {
        self.content_ops().load(category_id).await
    }

    pub async fn delete_content(&self, id: &str) -> Result<(), GuiError> {
        self.content_ops().delete(id).await
    }

    pub async fn toggle_content_published(&self, id: &str) -> Result<ContentItem, GuiError> {
        self.content_ops().toggle_published(id).await
    }

    pub async fn toggle_content_premium(&self, id: &str) -> Result<ContentItem, GuiError> {
        self.content_ops().toggle_premium(id).await
    }

    // =========================================================================
    // Editing and upload
    // =========================================================================

    /// Open an editor: `None` to create, `Some(item)` to edit.
    pub fn open_editor(&self, item: Option<&ContentItem>) -> EditSession {
        EditSession::open(
            Arc::clone(&self.deps.capability),
            self.deps.settings.effective_max_upload_bytes(),
            Arc::clone(&self.deps.previews),
            Arc::clone(&self.playback),
            item,
        )
    }

    /// Decode durations of the editor's staged files with the injected probe.
    pub async fn probe_durations(&self, session: &EditSession) -> usize {
        session.probe_durations(self.deps.probe.as_ref()).await
    }

    pub async fn submit(&self, session: &EditSession) -> Result<ContentItem, GuiError> {
        self.content_ops().submit(session).await
    }

    pub fn cancel_upload(&self) -> bool {
        self.content_ops().cancel_upload()
    }

    pub fn upload_snapshot(&self) -> UploadSnapshot {
        self.upload.snapshot()
    }

    pub fn subscribe_upload(&self) -> watch::Receiver<UploadSnapshot> {
        self.upload.subscribe()
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// The coordinator adapters forward play/pause requests and transport
    /// reports to.
    pub fn playback(&self) -> &Arc<PlaybackCoordinator> {
        &self.playback
    }
}
