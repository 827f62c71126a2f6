//! Event emitter trait for coordinator events.
//!
//! Implementations handle transport details (channels, UI bindings, etc.).

use crate::events::CoordinatorEvent;

/// Trait for emitting coordinator events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - Adapter-specific implementations (UI bridge, channels)
pub trait EventEmitter: Send + Sync {
    /// Emit an event.
    ///
    /// This method should not block.
    fn emit(&self, event: CoordinatorEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn EventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: CoordinatorEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn EventEmitter> {
        Box::new(self.clone())
    }
}
