//! Media transport port.
//!
//! A transport is whatever actually renders audio for a media key (an
//! audio element, a native player). The playback coordinator commands
//! transports; transports report back through the coordinator's
//! `report_*` methods.

use crate::domain::MediaKey;

/// Commands understood by a media transport.
pub trait MediaTransport: Send + Sync {
    /// Start or resume playback.
    fn play(&self, key: &MediaKey);

    /// Pause playback, keeping the position.
    fn pause(&self, key: &MediaKey);

    /// Jump to an absolute position in seconds.
    fn seek(&self, key: &MediaKey, seconds: f64);

    /// Mute or unmute output.
    fn set_muted(&self, key: &MediaKey, muted: bool);
}

/// A transport that ignores all commands.
#[derive(Debug, Clone, Default)]
pub struct NoopTransport;

impl MediaTransport for NoopTransport {
    fn play(&self, _key: &MediaKey) {}
    fn pause(&self, _key: &MediaKey) {}
    fn seek(&self, _key: &MediaKey, _seconds: f64) {}
    fn set_muted(&self, _key: &MediaKey, _muted: bool) {}
}
