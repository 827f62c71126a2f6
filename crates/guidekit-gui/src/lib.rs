//! Content manager facade for guidekit adapters.
//!
//! This crate provides `ContentManager`, a platform-agnostic orchestration
//! layer that rendering adapters delegate to. It ties the feature crates
//! together behind one surface.
//!
//! # Architecture
//!
//! ```text
//! Adapters:        (web, desktop, headless)
//!                          ↓
//! Facade:            guidekit-gui
//!                   ContentManager
//!                    ↓          ↓
//! Features:  guidekit-media  guidekit-upload
//!                    ↓          ↓
//! Core:             guidekit-core
//! ```
//!
//! # Rules
//!
//! 1. **No adapter dependencies** - Must not depend on an HTTP client or UI toolkit
//! 2. **Pure orchestration** - All deps injected via `ManagerDeps`
//! 3. **Trait-based injection** - Uses port traits, not concrete impls
//! 4. **Semantic errors** - Returns `GuiError`, adapters map to their error types

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dev-dependencies only exercised by integration tests.
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tracing_subscriber as _;

mod backend;
mod categories;
mod content;
mod deps;
mod editor;
mod error;
pub mod mutator;

// Primary exports
pub use backend::ContentManager;
pub use deps::ManagerDeps;
pub use editor::EditSession;
pub use error::GuiError;

// Re-export operation modules for direct access if needed
pub use categories::CategoryOps;
pub use content::ContentOps;
pub use mutator::{OptimisticMutator, PendingMutation, is_temp_id};

// Re-export commonly used types for convenience
pub use guidekit_core::{Category, CategoryPatch, ContentItem, UploadPhase, UploadSnapshot};
pub use guidekit_media::{ContentForm, MergedMedia, PlaybackCoordinator, StageReport};
