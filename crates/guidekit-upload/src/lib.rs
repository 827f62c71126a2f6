//! Upload sessions for guidekit.
//!
//! - `progress` - displayed-progress estimation
//! - `session` - single-flight upload session with cancellation

#![deny(unused_crate_dependencies)]

pub mod progress;
pub mod session;

pub use progress::{ProgressEstimator, ProgressSample};
pub use session::{UploadConfig, UploadSession};

#[cfg(test)]
use tokio_test as _;
