//! Exclusive playback coordination.
//!
//! Every rendered media control (card grids, existing-media lists,
//! staged-file lists) shares one `PlaybackCoordinator`. The coordinator
//! owns the registry of per-key playback state and enforces that at most
//! one key is `Playing` at any instant, so callers never pause siblings
//! themselves.
//!
//! # State machine (per key)
//!
//! ```text
//!            request_play / report_playing
//!  Stopped ─────────────────────────────────▶ Playing
//!     ▲  ▲                                      │  │
//!     │  └──── another key plays (forced) ──────┘  │ request_pause / report_paused
//!     │            report_ended (pos → 0)          ▼
//!     └─────────────────────────────────────── Paused
//! ```
//!
//! Operations on unknown keys are no-ops: a key may disappear between a UI
//! update and a transport notification.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use guidekit_core::events::{CoordinatorEvent, PlaybackState};
use guidekit_core::ports::{EventEmitter, MediaTransport};
use guidekit_core::MediaKey;

/// Observed state of one media handle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackEntry {
    pub state: PlaybackState,
    /// Last known position in seconds.
    pub current_time: f64,
    /// Last known duration in seconds; 0 when unknown.
    pub duration: f64,
    pub muted: bool,
}

/// Registry of playback entries plus the single playing key.
#[derive(Debug, Default)]
struct PlaybackRegistry {
    entries: IndexMap<MediaKey, PlaybackEntry>,
    playing: Option<MediaKey>,
}

impl PlaybackRegistry {
    fn playing_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.state == PlaybackState::Playing)
            .count()
    }
}

/// Coordinates playback across every media control in the UI.
///
/// Cheap to share: wrap in `Arc` and hand the same instance to every list.
/// The registry lock is never held while calling into the transport.
pub struct PlaybackCoordinator {
    registry: Mutex<PlaybackRegistry>,
    transport: Arc<dyn MediaTransport>,
    emitter: Arc<dyn EventEmitter>,
}

impl PlaybackCoordinator {
    /// Create a coordinator commanding `transport` and reporting through `emitter`.
    pub fn new(transport: Arc<dyn MediaTransport>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            registry: Mutex::new(PlaybackRegistry::default()),
            transport,
            emitter,
        }
    }

    fn registry(&self) -> MutexGuard<'_, PlaybackRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, key: &MediaKey, state: PlaybackState) {
        self.emitter
            .emit(CoordinatorEvent::playback(key.clone(), state));
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a key, or refresh its duration if already known.
    pub fn register(&self, key: MediaKey, duration: f64) {
        let mut registry = self.registry();
        let entry = registry.entries.entry(key).or_default();
        if duration.is_finite() && duration > 0.0 {
            entry.duration = duration;
        }
    }

    /// Forget a key. If it was playing, its transport is paused first.
    pub fn unregister(&self, key: &MediaKey) {
        let was_playing = {
            let mut registry = self.registry();
            if registry.entries.shift_remove(key).is_none() {
                return;
            }
            if registry.playing.as_ref() == Some(key) {
                registry.playing = None;
                true
            } else {
                false
            }
        };
        if was_playing {
            self.transport.pause(key);
            self.notify(key, PlaybackState::Stopped);
        }
        tracing::trace!(%key, "Playback key unregistered");
    }

    /// Forget every key matching `predicate` (e.g. all keys of one item).
    pub fn unregister_where(&self, predicate: impl Fn(&MediaKey) -> bool) {
        let keys: Vec<MediaKey> = self
            .registry()
            .entries
            .keys()
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        for key in &keys {
            self.unregister(key);
        }
    }

    // =========================================================================
    // Caller intent
    // =========================================================================

    /// Start playing `key`, stopping whichever key is currently playing.
    ///
    /// The previously playing key is paused on its transport and moves to
    /// `Stopped` with its position preserved. Returns `false` for unknown keys.
    pub fn request_play(&self, key: &MediaKey) -> bool {
        let displaced = {
            let mut registry = self.registry();
            if !registry.entries.contains_key(key) {
                return false;
            }
            let displaced = Self::take_displaced(&mut registry, key);
            if let Some(entry) = registry.entries.get_mut(key) {
                entry.state = PlaybackState::Playing;
            }
            registry.playing = Some(key.clone());
            debug_assert!(registry.playing_count() <= 1);
            displaced
        };

        if let Some(other) = &displaced {
            self.transport.pause(other);
            self.notify(other, PlaybackState::Stopped);
        }
        self.transport.play(key);
        self.notify(key, PlaybackState::Playing);
        tracing::debug!(%key, displaced = ?displaced, "Playback started");
        true
    }

    /// Pause `key` at its current position.
    pub fn request_pause(&self, key: &MediaKey) {
        {
            let mut registry = self.registry();
            let Some(entry) = registry.entries.get_mut(key) else {
                return;
            };
            if entry.state != PlaybackState::Playing {
                return;
            }
            entry.state = PlaybackState::Paused;
            registry.playing = None;
        }
        self.transport.pause(key);
        self.notify(key, PlaybackState::Paused);
    }

    /// Play if not playing, pause otherwise.
    pub fn toggle(&self, key: &MediaKey) {
        match self.state(key) {
            Some(PlaybackState::Playing) => self.request_pause(key),
            Some(_) => {
                self.request_play(key);
            }
            None => {}
        }
    }

    /// Stop `key` if it is the playing entry (position preserved).
    pub fn stop(&self, key: &MediaKey) {
        {
            let mut registry = self.registry();
            if registry.playing.as_ref() != Some(key) {
                return;
            }
            registry.playing = None;
            if let Some(entry) = registry.entries.get_mut(key) {
                entry.state = PlaybackState::Stopped;
            }
        }
        self.transport.pause(key);
        self.notify(key, PlaybackState::Stopped);
    }

    /// Stop whatever is playing.
    pub fn stop_all(&self) {
        let playing = self.registry().playing.clone();
        if let Some(key) = playing {
            self.stop(&key);
        }
    }

    /// Seek to a fractional position (`0.0..=1.0`) of the known duration.
    ///
    /// Ignored when the duration is 0 or unknown.
    pub fn seek(&self, key: &MediaKey, fraction: f64) {
        let target = {
            let mut registry = self.registry();
            let Some(entry) = registry.entries.get_mut(key) else {
                return;
            };
            if !(entry.duration.is_finite() && entry.duration > 0.0) || fraction.is_nan() {
                return;
            }
            let target = fraction.clamp(0.0, 1.0) * entry.duration;
            entry.current_time = target;
            target
        };
        self.transport.seek(key, target);
    }

    /// Flip the mute flag of one key. Does not affect any other key.
    pub fn toggle_mute(&self, key: &MediaKey) {
        let muted = {
            let mut registry = self.registry();
            let Some(entry) = registry.entries.get_mut(key) else {
                return;
            };
            entry.muted = !entry.muted;
            entry.muted
        };
        self.transport.set_muted(key, muted);
    }

    // =========================================================================
    // Transport notifications
    // =========================================================================

    /// The transport started playing on its own (e.g. native controls).
    ///
    /// The single-playing invariant still holds: any other playing key is
    /// paused and stopped.
    pub fn report_playing(&self, key: &MediaKey) {
        let displaced = {
            let mut registry = self.registry();
            if !registry.entries.contains_key(key) {
                return;
            }
            let displaced = Self::take_displaced(&mut registry, key);
            if let Some(entry) = registry.entries.get_mut(key) {
                entry.state = PlaybackState::Playing;
            }
            registry.playing = Some(key.clone());
            displaced
        };
        if let Some(other) = &displaced {
            self.transport.pause(other);
            self.notify(other, PlaybackState::Stopped);
        }
        self.notify(key, PlaybackState::Playing);
    }

    /// The transport paused.
    ///
    /// A pause for a key the coordinator already stopped (the echo of a
    /// forced stop) leaves it `Stopped`.
    pub fn report_paused(&self, key: &MediaKey) {
        let changed = {
            let mut registry = self.registry();
            let Some(entry) = registry.entries.get_mut(key) else {
                return;
            };
            if entry.state == PlaybackState::Playing {
                entry.state = PlaybackState::Paused;
                if registry.playing.as_ref() == Some(key) {
                    registry.playing = None;
                }
                true
            } else {
                false
            }
        };
        if changed {
            self.notify(key, PlaybackState::Paused);
        }
    }

    /// The transport reached the end of the media. Position resets to 0.
    pub fn report_ended(&self, key: &MediaKey) {
        {
            let mut registry = self.registry();
            let Some(entry) = registry.entries.get_mut(key) else {
                return;
            };
            entry.state = PlaybackState::Stopped;
            entry.current_time = 0.0;
            if registry.playing.as_ref() == Some(key) {
                registry.playing = None;
            }
        }
        self.notify(key, PlaybackState::Stopped);
    }

    /// Time/metadata update from the transport.
    pub fn report_time(&self, key: &MediaKey, current_time: f64, duration: f64) {
        let mut registry = self.registry();
        let Some(entry) = registry.entries.get_mut(key) else {
            return;
        };
        if current_time.is_finite() && current_time >= 0.0 {
            entry.current_time = current_time;
        }
        if duration.is_finite() && duration > 0.0 {
            entry.duration = duration;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// State of a key, `None` if unknown.
    pub fn state(&self, key: &MediaKey) -> Option<PlaybackState> {
        self.registry().entries.get(key).map(|e| e.state)
    }

    /// Full entry of a key, `None` if unknown.
    pub fn entry(&self, key: &MediaKey) -> Option<PlaybackEntry> {
        self.registry().entries.get(key).copied()
    }

    /// The key currently playing, if any.
    pub fn playing_key(&self) -> Option<MediaKey> {
        self.registry().playing.clone()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.registry().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().entries.is_empty()
    }

    /// Number of entries in `Playing` state (0 or 1).
    pub fn playing_count(&self) -> usize {
        self.registry().playing_count()
    }

    /// Move the currently playing key (other than `key`) to `Stopped`.
    fn take_displaced(registry: &mut PlaybackRegistry, key: &MediaKey) -> Option<MediaKey> {
        let other = registry.playing.take().filter(|p| p != key)?;
        if let Some(entry) = registry.entries.get_mut(&other) {
            entry.state = PlaybackState::Stopped;
        }
        Some(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidekit_core::ports::NoopEmitter;

    mockall::mock! {
        Transport {}

        impl MediaTransport for Transport {
            fn play(&self, key: &MediaKey);
            fn pause(&self, key: &MediaKey);
            fn seek(&self, key: &MediaKey, seconds: f64);
            fn set_muted(&self, key: &MediaKey, muted: bool);
        }
    }

    fn coordinator(transport: MockTransport) -> PlaybackCoordinator {
        PlaybackCoordinator::new(Arc::new(transport), Arc::new(NoopEmitter::new()))
    }

    fn permissive() -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_play().return_const(());
        transport.expect_pause().return_const(());
        transport.expect_seek().return_const(());
        transport.expect_set_muted().return_const(());
        transport
    }

    #[test]
    fn test_play_b_stops_a_and_preserves_position() {
        let a = MediaKey::item("1", 0);
        let b = MediaKey::item("1", 1);

        let mut transport = MockTransport::new();
        transport.expect_play().times(2).return_const(());
        transport
            .expect_pause()
            .withf(|k| *k == MediaKey::item("1", 0))
            .times(1)
            .return_const(());

        let coordinator = coordinator(transport);
        coordinator.register(a.clone(), 120.0);
        coordinator.register(b.clone(), 60.0);

        assert!(coordinator.request_play(&a));
        coordinator.report_time(&a, 33.0, 120.0);
        assert!(coordinator.request_play(&b));

        let a_entry = coordinator.entry(&a).unwrap();
        assert_eq!(a_entry.state, PlaybackState::Stopped);
        assert!((a_entry.current_time - 33.0).abs() < f64::EPSILON);
        assert_eq!(coordinator.state(&b), Some(PlaybackState::Playing));
        assert_eq!(coordinator.playing_key(), Some(b));
    }

    #[test]
    fn test_single_playing_invariant_over_sequence() {
        let coordinator = coordinator(permissive());
        let keys: Vec<MediaKey> = (0..5)
            .map(|i| MediaKey::item("item", i))
            .chain((0..3).map(|i| MediaKey::staged(format!("s{i}"))))
            .collect();
        for key in &keys {
            coordinator.register(key.clone(), 10.0);
        }

        for step in 0..40 {
            let key = &keys[(step * 7 + 3) % keys.len()];
            coordinator.request_play(key);
            assert_eq!(coordinator.playing_count(), 1);
            assert_eq!(coordinator.playing_key().as_ref(), Some(key));
        }
    }

    #[test]
    fn test_unknown_key_is_noop() {
        let transport = MockTransport::new();
        let coordinator = coordinator(transport);
        let ghost = MediaKey::staged("ghost");

        assert!(!coordinator.request_play(&ghost));
        coordinator.report_paused(&ghost);
        coordinator.report_ended(&ghost);
        coordinator.seek(&ghost, 0.5);
        coordinator.toggle_mute(&ghost);
        coordinator.stop(&ghost);
        assert_eq!(coordinator.state(&ghost), None);
    }

    #[test]
    fn test_pause_echo_after_forced_stop_keeps_stopped() {
        let coordinator = coordinator(permissive());
        let a = MediaKey::item("1", 0);
        let b = MediaKey::item("2", 0);
        coordinator.register(a.clone(), 0.0);
        coordinator.register(b.clone(), 0.0);

        coordinator.request_play(&a);
        coordinator.request_play(&b);
        // Transport echoes the pause we issued for `a`.
        coordinator.report_paused(&a);

        assert_eq!(coordinator.state(&a), Some(PlaybackState::Stopped));
        assert_eq!(coordinator.state(&b), Some(PlaybackState::Playing));
    }

    #[test]
    fn test_report_paused_and_ended() {
        let coordinator = coordinator(permissive());
        let a = MediaKey::item("1", 0);
        coordinator.register(a.clone(), 100.0);

        coordinator.request_play(&a);
        coordinator.report_paused(&a);
        assert_eq!(coordinator.state(&a), Some(PlaybackState::Paused));
        assert_eq!(coordinator.playing_key(), None);

        coordinator.request_play(&a);
        coordinator.report_time(&a, 99.0, 100.0);
        coordinator.report_ended(&a);
        let entry = coordinator.entry(&a).unwrap();
        assert_eq!(entry.state, PlaybackState::Stopped);
        assert!(entry.current_time.abs() < f64::EPSILON);
    }

    #[test]
    fn test_seek_maps_fraction_to_duration() {
        let key = MediaKey::staged("x");
        let mut transport = MockTransport::new();
        transport
            .expect_seek()
            .withf(|_, secs| (*secs - 45.0).abs() < 1e-9)
            .times(1)
            .return_const(());
        let coordinator = coordinator(transport);
        coordinator.register(key.clone(), 90.0);

        coordinator.seek(&key, 0.5);
        assert!((coordinator.entry(&key).unwrap().current_time - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_ignored_without_duration() {
        let key = MediaKey::staged("x");
        let mut transport = MockTransport::new();
        transport.expect_seek().times(0);
        let coordinator = coordinator(transport);
        coordinator.register(key.clone(), 0.0);

        coordinator.seek(&key, 0.5);
        assert!(coordinator.entry(&key).unwrap().current_time.abs() < f64::EPSILON);
    }

    #[test]
    fn test_toggle_mute_is_local() {
        let coordinator = coordinator(permissive());
        let a = MediaKey::item("1", 0);
        let b = MediaKey::item("1", 1);
        coordinator.register(a.clone(), 1.0);
        coordinator.register(b.clone(), 1.0);

        coordinator.request_play(&a);
        coordinator.toggle_mute(&b);

        assert!(coordinator.entry(&b).unwrap().muted);
        assert!(!coordinator.entry(&a).unwrap().muted);
        assert_eq!(coordinator.state(&a), Some(PlaybackState::Playing));
    }

    #[test]
    fn test_report_playing_enforces_invariant() {
        let coordinator = coordinator(permissive());
        let a = MediaKey::item("1", 0);
        let b = MediaKey::staged("s");
        coordinator.register(a.clone(), 1.0);
        coordinator.register(b.clone(), 1.0);

        coordinator.request_play(&a);
        coordinator.report_playing(&b);

        assert_eq!(coordinator.state(&a), Some(PlaybackState::Stopped));
        assert_eq!(coordinator.playing_count(), 1);
    }

    #[test]
    fn test_unregister_playing_key_pauses_transport() {
        let key = MediaKey::item("9", 0);
        let mut transport = MockTransport::new();
        transport.expect_play().return_const(());
        transport.expect_pause().times(1).return_const(());
        let coordinator = coordinator(transport);
        coordinator.register(key.clone(), 1.0);
        coordinator.request_play(&key);

        coordinator.unregister(&key);
        assert_eq!(coordinator.playing_key(), None);
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_unregister_where_item() {
        let coordinator = coordinator(permissive());
        coordinator.register(MediaKey::item("a", 0), 1.0);
        coordinator.register(MediaKey::item("a", 1), 1.0);
        coordinator.register(MediaKey::item("b", 0), 1.0);

        coordinator.unregister_where(|k| k.belongs_to("a"));
        assert_eq!(coordinator.len(), 1);
    }

    #[test]
    fn test_toggle_play_pause() {
        let coordinator = coordinator(permissive());
        let key = MediaKey::staged("t");
        coordinator.register(key.clone(), 1.0);

        coordinator.toggle(&key);
        assert_eq!(coordinator.state(&key), Some(PlaybackState::Playing));
        coordinator.toggle(&key);
        assert_eq!(coordinator.state(&key), Some(PlaybackState::Paused));
        coordinator.stop_all();
        assert_eq!(coordinator.playing_key(), None);
    }
}
