//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the coordinator expects from its
//! environment. They contain no transport details and use only domain types.
//!
//! # Design Rules
//!
//! - No HTTP or UI toolkit types in any signature
//! - Repository methods mirror the backend's CRUD surface one-to-one
//! - Media transports are commanded, never owned

pub mod content_repository;
pub mod duration_probe;
pub mod event_emitter;
pub mod media_transport;
pub mod preview_store;

pub use content_repository::{ContentRepository, ProgressCallback, TransferOptions};
pub use duration_probe::{DurationProbe, NoopDurationProbe, ProbeError};
pub use event_emitter::{EventEmitter, NoopEmitter};
pub use media_transport::{MediaTransport, NoopTransport};
pub use preview_store::{LocalPreviewStore, PreviewStore};
