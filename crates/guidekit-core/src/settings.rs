//! Coordinator settings and validation.
//!
//! All fields are optional so partial configuration files deserialize and
//! missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};

/// Largest file accepted for staging (200 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Displayed percent ceiling while the transport is still sending.
pub const DEFAULT_TRANSPORT_PROGRESS_CAP: f64 = 90.0;

/// Multiplier applied to the raw ETA to cover server-side finalization.
pub const DEFAULT_ETA_BUFFER_FACTOR: f64 = 1.1;

/// Pause between reaching 100% and reporting completion.
pub const DEFAULT_COMPLETION_SETTLE_MS: u64 = 400;

/// Minimum interval between emitted progress events.
pub const DEFAULT_PROGRESS_EMIT_INTERVAL_MS: u64 = 100;

/// Coordinator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Maximum size of a single staged file in bytes.
    pub max_upload_bytes: Option<u64>,

    /// Percent at which displayed progress is held until the transport
    /// completes (1.0 - 100.0).
    pub transport_progress_cap: Option<f64>,

    /// ETA multiplier (>= 1.0).
    pub eta_buffer_factor: Option<f64>,

    /// Delay after 100% before the session reports completion.
    pub completion_settle_ms: Option<u64>,

    /// Minimum interval between progress events.
    pub progress_emit_interval_ms: Option<u64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    pub const fn with_defaults() -> Self {
        Self {
            max_upload_bytes: Some(DEFAULT_MAX_UPLOAD_BYTES),
            transport_progress_cap: Some(DEFAULT_TRANSPORT_PROGRESS_CAP),
            eta_buffer_factor: Some(DEFAULT_ETA_BUFFER_FACTOR),
            completion_settle_ms: Some(DEFAULT_COMPLETION_SETTLE_MS),
            progress_emit_interval_ms: Some(DEFAULT_PROGRESS_EMIT_INTERVAL_MS),
        }
    }

    pub const fn effective_max_upload_bytes(&self) -> u64 {
        match self.max_upload_bytes {
            Some(bytes) => bytes,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn effective_transport_progress_cap(&self) -> f64 {
        self.transport_progress_cap
            .unwrap_or(DEFAULT_TRANSPORT_PROGRESS_CAP)
    }

    pub fn effective_eta_buffer_factor(&self) -> f64 {
        self.eta_buffer_factor.unwrap_or(DEFAULT_ETA_BUFFER_FACTOR)
    }

    pub const fn effective_completion_settle_ms(&self) -> u64 {
        match self.completion_settle_ms {
            Some(ms) => ms,
            None => DEFAULT_COMPLETION_SETTLE_MS,
        }
    }

    pub const fn effective_progress_emit_interval_ms(&self) -> u64 {
        match self.progress_emit_interval_ms {
            Some(ms) => ms,
            None => DEFAULT_PROGRESS_EMIT_INTERVAL_MS,
        }
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(bytes) = other.max_upload_bytes {
            self.max_upload_bytes = bytes;
        }
        if let Some(cap) = other.transport_progress_cap {
            self.transport_progress_cap = cap;
        }
        if let Some(factor) = other.eta_buffer_factor {
            self.eta_buffer_factor = factor;
        }
        if let Some(ms) = other.completion_settle_ms {
            self.completion_settle_ms = ms;
        }
        if let Some(ms) = other.progress_emit_interval_ms {
            self.progress_emit_interval_ms = ms;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub max_upload_bytes: Option<Option<u64>>,
    pub transport_progress_cap: Option<Option<f64>>,
    pub eta_buffer_factor: Option<Option<f64>>,
    pub completion_settle_ms: Option<Option<u64>>,
    pub progress_emit_interval_ms: Option<Option<u64>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Max upload size must be greater than zero")]
    ZeroUploadLimit,

    #[error("Transport progress cap must be between 1 and 100, got {0}")]
    InvalidProgressCap(f64),

    #[error("ETA buffer factor must be at least 1.0, got {0}")]
    InvalidEtaBuffer(f64),

    #[error("Completion settle delay must be at most 10000 ms, got {0}")]
    InvalidSettleDelay(u64),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.max_upload_bytes == Some(0) {
        return Err(SettingsError::ZeroUploadLimit);
    }

    if let Some(cap) = settings.transport_progress_cap {
        if !(1.0..=100.0).contains(&cap) {
            return Err(SettingsError::InvalidProgressCap(cap));
        }
    }

    if let Some(factor) = settings.eta_buffer_factor {
        if !factor.is_finite() || factor < 1.0 {
            return Err(SettingsError::InvalidEtaBuffer(factor));
        }
    }

    if let Some(ms) = settings.completion_settle_ms {
        if ms > 10_000 {
            return Err(SettingsError::InvalidSettleDelay(ms));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.max_upload_bytes, Some(200 * 1024 * 1024));
        assert_eq!(settings.transport_progress_cap, Some(90.0));
        assert_eq!(settings.eta_buffer_factor, Some(1.1));
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_effective_values_fall_back() {
        let settings = Settings::default();
        assert_eq!(settings.effective_max_upload_bytes(), DEFAULT_MAX_UPLOAD_BYTES);
        assert!((settings.effective_transport_progress_cap() - 90.0).abs() < f64::EPSILON);
        assert_eq!(
            settings.effective_completion_settle_ms(),
            DEFAULT_COMPLETION_SETTLE_MS
        );
    }

    #[test]
    fn test_validate_progress_cap() {
        let settings = Settings {
            transport_progress_cap: Some(120.0),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidProgressCap(_))
        ));
    }

    #[test]
    fn test_validate_eta_buffer() {
        let settings = Settings {
            eta_buffer_factor: Some(0.5),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidEtaBuffer(_))
        ));
    }

    #[test]
    fn test_validate_zero_limit() {
        let settings = Settings {
            max_upload_bytes: Some(0),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::ZeroUploadLimit)
        );
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = Settings::with_defaults();
        let update = SettingsUpdate {
            transport_progress_cap: Some(Some(95.0)),
            completion_settle_ms: Some(None),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.transport_progress_cap, Some(95.0));
        assert_eq!(settings.completion_settle_ms, None);
        assert_eq!(settings.eta_buffer_factor, Some(1.1));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"max_upload_bytes": 1024}"#).unwrap();
        assert_eq!(settings.effective_max_upload_bytes(), 1024);
        assert_eq!(
            settings.effective_progress_emit_interval_ms(),
            DEFAULT_PROGRESS_EMIT_INTERVAL_MS
        );
    }
}
