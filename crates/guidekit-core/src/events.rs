//! Canonical event union emitted by the coordinator.
//!
//! Rendering layers subscribe to these instead of owning coordinator state.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "upload_progress", "sessionId": "…", "percent": 42.0, … }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::MediaKey;
use crate::upload::{UploadPhase, UploadSnapshot};

/// Playback state of one media key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Coordinator events for all adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// Progress tick of an upload session.
    UploadProgress {
        #[serde(rename = "sessionId")]
        session_id: String,
        snapshot: UploadSnapshot,
    },

    /// An upload session changed phase.
    UploadPhaseChanged {
        #[serde(rename = "sessionId")]
        session_id: String,
        phase: UploadPhase,
    },

    /// A media key changed playback state.
    PlaybackChanged { key: MediaKey, state: PlaybackState },

    /// An optimistically managed list changed.
    RecordsChanged {
        /// Entity label ("category", "content item").
        entity: String,
        count: usize,
    },

    /// A mutation failed and local state was rolled back.
    MutationFailed {
        entity: String,
        id: String,
        message: String,
    },
}

impl CoordinatorEvent {
    /// Create an upload progress event.
    pub fn upload_progress(session_id: impl Into<String>, snapshot: UploadSnapshot) -> Self {
        Self::UploadProgress {
            session_id: session_id.into(),
            snapshot,
        }
    }

    /// Create an upload phase event.
    pub fn upload_phase(session_id: impl Into<String>, phase: UploadPhase) -> Self {
        Self::UploadPhaseChanged {
            session_id: session_id.into(),
            phase,
        }
    }

    /// Create a playback event.
    pub const fn playback(key: MediaKey, state: PlaybackState) -> Self {
        Self::PlaybackChanged { key, state }
    }

    /// Create a records-changed event.
    pub fn records_changed(entity: &str, count: usize) -> Self {
        Self::RecordsChanged {
            entity: entity.to_string(),
            count,
        }
    }

    /// Create a mutation failure event.
    pub fn mutation_failed(entity: &str, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MutationFailed {
            entity: entity.to_string(),
            id: id.into(),
            message: message.into(),
        }
    }
}
