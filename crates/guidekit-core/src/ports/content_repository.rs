//! Content repository port.
//!
//! The backend's category and content endpoints, treated as an opaque
//! capability. Implementations handle all HTTP details internally.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Category, ContentItem, ContentPayload};
use crate::error::RepositoryError;

/// Progress callback receiving `(transferred_bytes, total_bytes)` on each
/// transport tick.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Instrumentation attached to a content upload.
///
/// Both fields are optional: metadata-only requests carry neither.
#[derive(Default)]
pub struct TransferOptions {
    /// Called by the transport as bytes leave the client.
    pub progress: Option<ProgressCallback>,
    /// Abort signal; implementations must return `RepositoryError::Cancelled`
    /// promptly once it fires.
    pub cancel: Option<CancellationToken>,
}

impl TransferOptions {
    /// Options for a plain request with no instrumentation.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Whether the caller asked for cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Report progress if a callback is attached.
    pub fn report(&self, transferred: u64, total: u64) {
        if let Some(progress) = &self.progress {
            progress(transferred, total);
        }
    }
}

impl std::fmt::Debug for TransferOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOptions")
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Backend CRUD surface for categories and content items.
///
/// # Design Rules
///
/// - `content_type` is the capability's backend key
/// - Create/update of content streams a multipart `ContentPayload`
/// - Returned records are authoritative and replace optimistic copies
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// List categories of a content type.
    async fn list_categories(&self, content_type: &str) -> Result<Vec<Category>, RepositoryError>;

    /// Create a category. The draft's id is ignored.
    async fn create_category(
        &self,
        content_type: &str,
        draft: &Category,
    ) -> Result<Category, RepositoryError>;

    /// Update a category with the full patched record.
    async fn update_category(
        &self,
        content_type: &str,
        category: &Category,
    ) -> Result<Category, RepositoryError>;

    /// Delete a category by id.
    async fn delete_category(&self, content_type: &str, id: &str) -> Result<(), RepositoryError>;

    /// List content items of one category.
    async fn list_content_by_category(
        &self,
        content_type: &str,
        category_id: &str,
    ) -> Result<Vec<ContentItem>, RepositoryError>;

    /// Create a content item from a multipart payload.
    async fn create_content(
        &self,
        content_type: &str,
        payload: ContentPayload,
        options: TransferOptions,
    ) -> Result<ContentItem, RepositoryError>;

    /// Update a content item from a multipart payload.
    async fn update_content(
        &self,
        content_type: &str,
        id: &str,
        payload: ContentPayload,
        options: TransferOptions,
    ) -> Result<ContentItem, RepositoryError>;

    /// Delete a content item by id.
    async fn delete_content(&self, content_type: &str, id: &str) -> Result<(), RepositoryError>;
}
