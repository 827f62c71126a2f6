//! Upload state types shared between the session and its observers.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    /// No submission in flight; the submit control is enabled.
    #[default]
    Idle,
    /// Bytes are being transferred.
    Uploading,
    /// Transport finished; waiting for the server to commit the record.
    Finalizing,
    /// Aborted by the user. Transient: the session returns to `Idle`.
    Cancelled,
    /// Request failed. Transient: the session returns to `Idle`.
    Failed,
}

impl UploadPhase {
    /// Convert to string representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Finalizing => "finalizing",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// Whether a submission is in flight (submit must stay disabled).
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Uploading | Self::Finalizing)
    }
}

/// Point-in-time view of an upload, as rendered by a progress bar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSnapshot {
    pub phase: UploadPhase,
    pub total_bytes: u64,
    pub transferred_bytes: u64,
    /// Displayed percentage (0.0 - 100.0), never decreasing within a session.
    pub percent: f64,
    /// Instantaneous speed; `None` until a positive speed was measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_bytes_per_sec: Option<f64>,
    /// Estimated seconds remaining; `None` until speed is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
}

impl UploadSnapshot {
    /// Idle snapshot with every progress field cleared.
    pub fn idle() -> Self {
        Self::default()
    }
}
