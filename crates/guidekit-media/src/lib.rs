//! Media handling for guidekit edit sessions.
//!
//! - `staging` - locally selected files awaiting upload
//! - `existing` - shadow state of server-confirmed media while editing
//! - `playback` - the single-playing coordinator shared by every media list
//! - `submission` - multipart payload assembly

#![deny(unused_crate_dependencies)]

pub mod existing;
pub mod playback;
pub mod staging;
pub mod submission;

pub use existing::{ExistingMediaRegistry, MergedMedia};
pub use playback::{PlaybackCoordinator, PlaybackEntry};
pub use staging::{MediaStagingArea, StageReport};
pub use submission::{ContentForm, build_payload};

// Dev-dependencies only exercised by integration tests.
#[cfg(test)]
use tempfile as _;
