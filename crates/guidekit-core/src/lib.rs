//! Core domain types and port definitions for guidekit.
//!
//! `guidekit` coordinates content uploads, optimistic list mutations and
//! exclusive media playback for guided-content managers. This crate holds
//! the pure pieces every other crate builds on:
//!
//! - `domain` - categories, content items, media, staged files, payloads
//! - `ports` - traits for the backend, media transports, previews, probes, events
//! - `error` - the error taxonomy
//! - `events` - the event union delivered to rendering layers
//! - `settings` - tunable limits and progress heuristics
//! - `upload` - upload phase and snapshot types

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod settings;
pub mod upload;

// Re-export commonly used types for convenience
pub use domain::{
    CapabilityFlags, Category, CategoryPatch, ContentItem, ContentPatch, ContentPayload,
    ContentTypeCapability, Entity, FileHandle, MediaItem, MediaKey, MediaKind, PayloadPart,
    SelectedFile, StagedFile, StagedStatus, normalize_tag,
};
pub use error::{CoordinatorError, MutationError, RepositoryError, StagingError, UploadError};
pub use events::{CoordinatorEvent, PlaybackState};
pub use ports::{
    ContentRepository, DurationProbe, EventEmitter, LocalPreviewStore, MediaTransport,
    NoopDurationProbe, NoopEmitter, NoopTransport, PreviewStore, ProbeError, ProgressCallback,
    TransferOptions,
};
pub use settings::{Settings, SettingsError, SettingsUpdate, validate_settings};
pub use upload::{UploadPhase, UploadSnapshot};

#[cfg(test)]
use tokio_test as _;
