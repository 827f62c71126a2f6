//! Duration probing port.
//!
//! Decodes a staged file's duration asynchronously. Probing is
//! best-effort: callers treat any error as "duration unknown".

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::FileHandle;

/// Failure to determine a file's duration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Cannot read {0}")]
    Unreadable(String),

    #[error("Unsupported media format")]
    Unsupported,
}

/// Port for decoding media durations.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the file in seconds.
    async fn probe(&self, file: &FileHandle) -> Result<f64, ProbeError>;
}

/// A probe that never decodes anything, for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopDurationProbe;

#[async_trait]
impl DurationProbe for NoopDurationProbe {
    async fn probe(&self, _file: &FileHandle) -> Result<f64, ProbeError> {
        Err(ProbeError::Unsupported)
    }
}
