//! Error taxonomy for the coordinator.
//!
//! Staging errors are local and recoverable, repository errors drive the
//! rollback paths, cancellation is kept apart from failure, and stale
//! rollbacks are discarded silently. Nothing here is fatal: every path
//! leaves the UI state consistent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection of a single file at staging time.
///
/// Reported per file; never aborts the rest of a batch.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StagingError {
    /// File exceeds the configured maximum upload size.
    #[error("{name} is {size} bytes, larger than the {max} byte limit")]
    UnsupportedSize {
        name: String,
        size: u64,
        max: u64,
    },

    /// File type is not in the content type's accept list.
    #[error("{name} is not an accepted file type ({accepted})")]
    UnsupportedType { name: String, accepted: String },

    /// No staged file with this local id.
    #[error("No staged file {local_id}")]
    NotStaged { local_id: String },

    /// No existing media entry at this position.
    #[error("No existing media at index {index}")]
    UnknownIndex { index: usize },
}

impl StagingError {
    /// Convert to a user-friendly message.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedSize { name, max, .. } => {
                format!(
                    "\"{name}\" is too large. Maximum size is {} MB.",
                    max / (1024 * 1024)
                )
            }
            Self::UnsupportedType { name, .. } => {
                format!("\"{name}\" is not a supported file type.")
            }
            Self::NotStaged { .. } | Self::UnknownIndex { .. } => {
                "That file is no longer available.".to_string()
            }
        }
    }
}

/// Failure of a `ContentRepository` call.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum RepositoryError {
    /// Network/HTTP failure.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The addressed record does not exist on the backend.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request observed its cancellation signal.
    #[error("Request cancelled")]
    Cancelled,

    /// Response could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Check if this is a cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Outcome of an upload that did not complete.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadError {
    /// A submission is already in flight for this session.
    #[error("An upload is already in progress")]
    Busy,

    /// Aborted by the user. Not a failure.
    #[error("Upload cancelled")]
    Cancelled,

    /// The transfer or the server rejected the submission.
    #[error(transparent)]
    Transfer(#[from] RepositoryError),
}

impl UploadError {
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Failure of an optimistic mutation, after local state was rolled back.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum MutationError {
    /// The server rejected the mutation; local state has been restored.
    #[error("{message}")]
    Failed {
        /// User-facing message, e.g. "Error saving content item.".
        message: String,
        /// Underlying cause.
        cause: String,
        /// The request was cancelled rather than rejected.
        cancelled: bool,
    },

    /// The rollback was superseded by a newer mutation and discarded.
    #[error("Stale mutation for {id} (stamp {stamp})")]
    Stale { id: String, stamp: u64 },

    /// The record is not in the local list.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
}

impl MutationError {
    /// Whether the user should see this error.
    pub const fn should_surface(&self) -> bool {
        match self {
            Self::Failed { cancelled, .. } => !*cancelled,
            Self::Stale { .. } => false,
            Self::NotFound { .. } => true,
        }
    }
}

/// Umbrella error for coordinator operations.
///
/// Adapters map this to their own presentation (toasts, dialogs).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// The edit session was closed before the operation finished.
    #[error("Edit session closed")]
    SessionClosed,
}

impl CoordinatorError {
    /// Check if this is a user cancellation anywhere in the chain.
    pub const fn is_cancelled(&self) -> bool {
        match self {
            Self::Repository(e) => e.is_cancelled(),
            Self::Upload(e) => e.is_cancelled(),
            Self::Mutation(MutationError::Failed { cancelled, .. }) => *cancelled,
            _ => false,
        }
    }

    /// Whether the error should be shown to the user.
    pub const fn should_surface(&self) -> bool {
        match self {
            Self::Mutation(e) => e.should_surface(),
            Self::SessionClosed => false,
            _ => !self.is_cancelled(),
        }
    }

    /// Convert to a user-friendly message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Staging(e) => e.user_message(),
            Self::Repository(e) => e.to_string(),
            Self::Upload(UploadError::Busy) => {
                "Please wait for the current upload to finish.".to_string()
            }
            Self::Upload(UploadError::Cancelled) => "Upload cancelled.".to_string(),
            Self::Upload(UploadError::Transfer(e)) => format!("Upload failed: {e}"),
            Self::Mutation(e) => e.to_string(),
            Self::SessionClosed => "The editor was closed.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_not_surfaced() {
        let err = CoordinatorError::from(UploadError::Cancelled);
        assert!(err.is_cancelled());
        assert!(!err.should_surface());

        let err = CoordinatorError::from(RepositoryError::Cancelled);
        assert!(!err.should_surface());
    }

    #[test]
    fn test_stale_mutation_is_not_surfaced() {
        let err = CoordinatorError::from(MutationError::Stale {
            id: "c1".to_string(),
            stamp: 3,
        });
        assert!(!err.should_surface());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_failed_mutation_message() {
        let err = MutationError::Failed {
            message: "Error saving content item.".to_string(),
            cause: "Network error: 500".to_string(),
            cancelled: false,
        };
        assert_eq!(err.to_string(), "Error saving content item.");
        assert!(CoordinatorError::from(err).should_surface());
    }

    #[test]
    fn test_size_error_message_in_megabytes() {
        let err = StagingError::UnsupportedSize {
            name: "b.wav".to_string(),
            size: 250 * 1024 * 1024,
            max: 200 * 1024 * 1024,
        };
        assert!(err.user_message().contains("200 MB"));
    }

    #[test]
    fn test_repository_error_serialization() {
        let err = RepositoryError::network_with_status("bad gateway", 502);
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("502"));
        let parsed: RepositoryError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }
}
