//! Semantic error types for content manager operations.
//!
//! These errors are presentation-focused. Adapters map `GuiError` to their
//! own surface (toast, inline message, dialog).

use std::fmt;

use guidekit_core::{
    CoordinatorError, MutationError, RepositoryError, SettingsError, StagingError, UploadError,
};

/// Semantic errors for content manager operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiError {
    /// Entity not found.
    NotFound {
        /// Type of entity (e.g., "category", "content item").
        entity: String,
        /// Identifier that was not found.
        id: String,
    },

    /// Input rejected before anything was sent (file too large, bad type).
    ValidationFailed(String),

    /// Operation conflicts with current state (upload in flight).
    Conflict(String),

    /// Backend could not be reached or rejected the request.
    Unavailable(String),

    /// A mutation failed and was rolled back. Carries the user message.
    Rejected(String),

    /// The user cancelled, or the operation was superseded. Never shown.
    Cancelled,

    /// Unexpected internal error.
    Internal(String),
}

impl GuiError {
    /// Whether the UI should show this error.
    pub const fn should_surface(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for GuiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::Unavailable(msg) => write!(f, "service unavailable: {msg}"),
            Self::Rejected(msg) => f.write_str(msg),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for GuiError {}

// ============================================================================
// Conversions from core errors
// ============================================================================

impl From<StagingError> for GuiError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::NotStaged { local_id } => Self::NotFound {
                entity: "staged file".to_string(),
                id: local_id,
            },
            StagingError::UnknownIndex { index } => Self::NotFound {
                entity: "media".to_string(),
                id: index.to_string(),
            },
            other => Self::ValidationFailed(other.user_message()),
        }
    }
}

impl From<RepositoryError> for GuiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Cancelled => Self::Cancelled,
            RepositoryError::NotFound(id) => Self::NotFound {
                entity: "record".to_string(),
                id,
            },
            RepositoryError::Serialization(msg) => Self::Internal(msg),
            network @ RepositoryError::Network { .. } => Self::Unavailable(network.to_string()),
        }
    }
}

impl From<UploadError> for GuiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Busy => Self::Conflict(err.to_string()),
            UploadError::Cancelled => Self::Cancelled,
            UploadError::Transfer(e) => e.into(),
        }
    }
}

impl From<MutationError> for GuiError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Failed {
                cancelled: true, ..
            }
            | MutationError::Stale { .. } => Self::Cancelled,
            MutationError::Failed { message, .. } => Self::Rejected(message),
            MutationError::NotFound { entity, id } => Self::NotFound { entity, id },
        }
    }
}

impl From<CoordinatorError> for GuiError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::Staging(e) => e.into(),
            CoordinatorError::Repository(e) => e.into(),
            CoordinatorError::Upload(e) => e.into(),
            CoordinatorError::Mutation(e) => e.into(),
            CoordinatorError::SessionClosed => Self::Cancelled,
        }
    }
}

impl From<SettingsError> for GuiError {
    fn from(err: SettingsError) -> Self {
        Self::ValidationFailed(err.to_string())
    }
}
