//! Dependency injection for `ContentManager`.
//!
//! All dependencies are injected as trait objects to maintain adapter neutrality.

use std::sync::Arc;

use guidekit_core::ports::{
    ContentRepository, DurationProbe, EventEmitter, LocalPreviewStore, MediaTransport,
    NoopDurationProbe, NoopTransport, PreviewStore,
};
use guidekit_core::{ContentTypeCapability, Settings};

/// Dependencies required to construct a `ContentManager`.
///
/// The backend, capability and emitter are required. Playback, previews,
/// duration probing and settings fall back to inert defaults and can be
/// replaced with the `with_*` builders.
///
/// # Example
///
/// ```ignore
/// let deps = ManagerDeps::new(repository, capability, emitter)
///     .with_transport(audio)
///     .with_settings(settings);
/// let manager = ContentManager::new(deps)?;
/// ```
pub struct ManagerDeps {
    /// Backend CRUD for categories and content.
    pub(crate) repository: Arc<dyn ContentRepository>,
    /// Capability record of the content type being managed.
    pub(crate) capability: Arc<ContentTypeCapability>,
    /// Event sink for the rendering layer.
    pub(crate) emitter: Arc<dyn EventEmitter>,
    /// Audio output driven by the playback coordinator.
    pub(crate) transport: Arc<dyn MediaTransport>,
    /// Preview resources for staged files.
    pub(crate) previews: Arc<dyn PreviewStore>,
    /// Duration decoder for staged files.
    pub(crate) probe: Arc<dyn DurationProbe>,
    /// Limits and progress heuristics.
    pub(crate) settings: Settings,
}

impl ManagerDeps {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        capability: Arc<ContentTypeCapability>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            repository,
            capability,
            emitter,
            transport: Arc::new(NoopTransport),
            previews: Arc::new(LocalPreviewStore),
            probe: Arc::new(NoopDurationProbe),
            settings: Settings::with_defaults(),
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn MediaTransport>) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn with_previews(mut self, previews: Arc<dyn PreviewStore>) -> Self {
        self.previews = previews;
        self
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Backend key of the managed content type.
    pub(crate) fn content_type(&self) -> &str {
        &self.capability.content_type
    }
}
