//! Progress estimation.
//!
//! This module turns raw transport ticks into displayable progress.

mod estimator;

pub use estimator::{ProgressEstimator, ProgressSample};
