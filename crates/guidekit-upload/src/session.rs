//! Upload session: one in-flight submission at a time, with progress,
//! speed, ETA and user cancellation.
//!
//! # Phases
//!
//! ```text
//! Idle ──run──▶ Uploading ──all bytes sent──▶ Finalizing ──ok──▶ (100%, settle) ──▶ Idle
//!                   │                              │
//!                   ├──cancel──▶ Cancelled ──▶ Idle │
//!                   └──error───▶ Failed ────▶ Idle ◀┘
//! ```
//!
//! # Concurrency Model
//!
//! - State lives behind a `std::sync::Mutex`, never held across `.await`
//! - Each run mints a generation; progress callbacks and completions from an
//!   older generation are ignored
//! - Observers read a `watch` channel or receive throttled events

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use guidekit_core::ports::{EventEmitter, TransferOptions};
use guidekit_core::{
    CoordinatorEvent, RepositoryError, Settings, UploadError, UploadPhase, UploadSnapshot,
};

use crate::progress::ProgressEstimator;

/// Tunables of an upload session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadConfig {
    /// Displayed percent ceiling while the transport is active.
    pub progress_cap: f64,
    /// ETA multiplier.
    pub eta_buffer: f64,
    /// Pause at 100% before returning to idle.
    pub settle_delay: Duration,
    /// Minimum interval between progress events.
    pub emit_interval: Duration,
}

impl UploadConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            progress_cap: settings.effective_transport_progress_cap(),
            eta_buffer: settings.effective_eta_buffer_factor(),
            settle_delay: Duration::from_millis(settings.effective_completion_settle_ms()),
            emit_interval: Duration::from_millis(settings.effective_progress_emit_interval_ms()),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::with_defaults())
    }
}

/// Minimum spacing between progress events. Phase changes reopen it.
#[derive(Debug)]
struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    const fn reset(&mut self) {
        self.last_emit = None;
    }

    fn admit(&mut self, now: Instant) -> bool {
        let too_soon = self
            .last_emit
            .is_some_and(|last| now.saturating_duration_since(last) < self.interval);
        if !too_soon {
            self.last_emit = Some(now);
        }
        !too_soon
    }
}

/// Mutable session state.
struct SessionState {
    generation: u64,
    cancel: Option<CancellationToken>,
    estimator: Option<ProgressEstimator>,
    throttle: ProgressThrottle,
    snapshot: UploadSnapshot,
}

/// What to publish after a state change, computed under the lock.
struct Publish {
    snapshot: UploadSnapshot,
    phase_changed: bool,
    emit_progress: bool,
}

struct SessionShared {
    id: String,
    config: UploadConfig,
    state: Mutex<SessionState>,
    progress_tx: watch::Sender<UploadSnapshot>,
    emitter: Arc<dyn EventEmitter>,
}

impl SessionShared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, publish: Publish) {
        let Publish {
            snapshot,
            phase_changed,
            emit_progress,
        } = publish;
        if phase_changed {
            self.emitter
                .emit(CoordinatorEvent::upload_phase(&self.id, snapshot.phase));
        }
        if emit_progress {
            self.emitter
                .emit(CoordinatorEvent::upload_progress(&self.id, snapshot.clone()));
        }
        self.progress_tx.send_replace(snapshot);
    }

    /// Transport tick. Ignored unless `generation` is the live run.
    fn on_progress(&self, generation: u64, transferred: u64, total: u64) {
        let publish = {
            let mut state = self.state();
            if state.generation != generation || state.cancel.is_none() {
                return;
            }
            let now = Instant::now();
            let Some(estimator) = state.estimator.as_mut() else {
                return;
            };
            let sample = estimator.observe(transferred, total, now);
            let total_bytes = estimator.total_bytes();

            let previous = state.snapshot.phase;
            let phase = if sample.transport_done {
                UploadPhase::Finalizing
            } else {
                previous
            };
            state.snapshot = UploadSnapshot {
                phase,
                total_bytes,
                transferred_bytes: transferred.min(total_bytes),
                percent: sample.percent,
                speed_bytes_per_sec: sample.speed_bytes_per_sec,
                eta_seconds: sample.eta_seconds,
            };

            let phase_changed = phase != previous;
            if phase_changed {
                state.throttle.reset();
            }
            let emit_progress = state.throttle.admit(now);
            Publish {
                snapshot: state.snapshot.clone(),
                phase_changed,
                emit_progress,
            }
        };
        self.publish(publish);
    }

    /// Move the live run to `phase`, clearing progress. Returns `false` if
    /// `generation` is no longer live.
    fn transition(&self, generation: u64, phase: UploadPhase) -> bool {
        let publish = {
            let mut state = self.state();
            if state.generation != generation {
                return false;
            }
            let total_bytes = state.snapshot.total_bytes;
            state.snapshot = UploadSnapshot {
                phase,
                total_bytes: if phase == UploadPhase::Idle { 0 } else { total_bytes },
                ..UploadSnapshot::idle()
            };
            if !phase.is_busy() {
                state.cancel = None;
                state.estimator = None;
            }
            Publish {
                snapshot: state.snapshot.clone(),
                phase_changed: true,
                emit_progress: false,
            }
        };
        self.publish(publish);
        true
    }

    /// Force the displayed percent to 100 and stop accepting cancellation.
    fn complete(&self, generation: u64) -> bool {
        let publish = {
            let mut state = self.state();
            if state.generation != generation {
                return false;
            }
            state.cancel = None;
            state.estimator = None;
            let previous = state.snapshot.phase;
            state.snapshot.phase = UploadPhase::Finalizing;
            state.snapshot.transferred_bytes = state.snapshot.total_bytes;
            state.snapshot.percent = 100.0;
            state.snapshot.eta_seconds = Some(0.0);
            Publish {
                snapshot: state.snapshot.clone(),
                phase_changed: previous != UploadPhase::Finalizing,
                emit_progress: true,
            }
        };
        self.publish(publish);
        true
    }
}

/// Returns the session to idle when a `run` future is dropped before it
/// finished, e.g. because the caller's task was aborted.
struct RunGuard<'a> {
    shared: &'a SessionShared,
    generation: u64,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let token = {
            let mut state = self.shared.state();
            if state.generation != self.generation {
                return;
            }
            state.cancel.take()
        };
        // No token left means the transfer succeeded and only the settle
        // delay was cut short.
        if let Some(token) = token {
            token.cancel();
            self.shared.transition(self.generation, UploadPhase::Cancelled);
        }
        self.shared.transition(self.generation, UploadPhase::Idle);
        tracing::debug!(
            session = %self.shared.id,
            generation = self.generation,
            "Upload dropped before completion"
        );
    }
}

/// A single-flight upload session.
///
/// Share it behind `Arc`; `run` and `cancel` take `&self`.
pub struct UploadSession {
    shared: Arc<SessionShared>,
}

impl UploadSession {
    /// Create an idle session.
    pub fn new(config: UploadConfig, emitter: Arc<dyn EventEmitter>) -> Self {
        let (progress_tx, _) = watch::channel(UploadSnapshot::idle());
        Self {
            shared: Arc::new(SessionShared {
                id: Uuid::new_v4().to_string(),
                state: Mutex::new(SessionState {
                    generation: 0,
                    cancel: None,
                    estimator: None,
                    throttle: ProgressThrottle::new(config.emit_interval),
                    snapshot: UploadSnapshot::idle(),
                }),
                config,
                progress_tx,
                emitter,
            }),
        }
    }

    /// Session id carried by every event this session emits.
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> UploadSnapshot {
        self.shared.state().snapshot.clone()
    }

    /// Whether a submission is in flight.
    pub fn is_busy(&self) -> bool {
        self.shared.state().snapshot.phase.is_busy()
    }

    /// Receive every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.shared.progress_tx.subscribe()
    }

    /// Run one submission.
    ///
    /// `transfer` receives the instrumentation to hand to the repository.
    /// With `total_bytes == 0` it gets only the cancel signal: metadata-only
    /// requests report no progress.
    ///
    /// # Errors
    ///
    /// - `UploadError::Busy` when another run is in flight
    /// - `UploadError::Cancelled` when the user cancelled (not a failure)
    /// - `UploadError::Transfer` when the request failed
    pub async fn run<T, F, Fut>(&self, total_bytes: u64, transfer: F) -> Result<T, UploadError>
    where
        F: FnOnce(TransferOptions) -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let (generation, cancel, publish) = {
            let mut state = self.shared.state();
            if state.snapshot.phase.is_busy() {
                return Err(UploadError::Busy);
            }
            state.generation += 1;
            let cancel = CancellationToken::new();
            state.cancel = Some(cancel.clone());
            state.estimator = (total_bytes > 0).then(|| {
                ProgressEstimator::new(
                    total_bytes,
                    self.shared.config.progress_cap,
                    self.shared.config.eta_buffer,
                    Instant::now(),
                )
            });
            state.throttle.reset();
            state.snapshot = UploadSnapshot {
                phase: UploadPhase::Uploading,
                total_bytes,
                ..UploadSnapshot::idle()
            };
            let publish = Publish {
                snapshot: state.snapshot.clone(),
                phase_changed: true,
                emit_progress: total_bytes > 0,
            };
            (state.generation, cancel, publish)
        };
        self.shared.publish(publish);
        tracing::debug!(session = %self.shared.id, generation, total_bytes, "Upload started");
        let mut guard = RunGuard {
            shared: &self.shared,
            generation,
            armed: true,
        };

        let progress = (total_bytes > 0).then(|| {
            let shared = Arc::clone(&self.shared);
            Box::new(move |transferred: u64, total: u64| {
                shared.on_progress(generation, transferred, total);
            }) as guidekit_core::ProgressCallback
        });
        let options = TransferOptions {
            progress,
            cancel: Some(cancel.clone()),
        };

        let result = tokio::select! {
            biased;

            () = cancel.cancelled() => Err(RepositoryError::Cancelled),

            result = transfer(options) => result,
        };

        let outcome = match result {
            Ok(value) => {
                if total_bytes > 0 && self.shared.complete(generation) {
                    let delay = self.shared.config.settle_delay;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                self.shared.transition(generation, UploadPhase::Idle);
                tracing::info!(session = %self.shared.id, generation, "Upload completed");
                Ok(value)
            }
            Err(e) if e.is_cancelled() || cancel.is_cancelled() => {
                // `cancel()` already reset the session; this covers transports
                // that gave up on their own.
                if self.shared.transition(generation, UploadPhase::Cancelled) {
                    self.shared.transition(generation, UploadPhase::Idle);
                }
                tracing::info!(session = %self.shared.id, generation, "Upload cancelled");
                Err(UploadError::Cancelled)
            }
            Err(e) => {
                if self.shared.transition(generation, UploadPhase::Failed) {
                    self.shared.transition(generation, UploadPhase::Idle);
                }
                tracing::warn!(session = %self.shared.id, generation, error = %e, "Upload failed");
                Err(UploadError::Transfer(e))
            }
        };
        guard.armed = false;
        outcome
    }

    /// Abort the in-flight submission.
    ///
    /// Returns `true` if a run was cancelled. Calling it again, or when
    /// nothing is in flight, does nothing.
    pub fn cancel(&self) -> bool {
        let (generation, token) = {
            let mut state = self.shared.state();
            if !state.snapshot.phase.is_busy() {
                return false;
            }
            let Some(token) = state.cancel.take() else {
                return false;
            };
            // Late ticks from the aborted transfer belong to a dead generation.
            state.generation += 1;
            (state.generation, token)
        };
        token.cancel();

        self.shared.transition(generation, UploadPhase::Cancelled);
        self.shared.transition(generation, UploadPhase::Idle);
        tracing::info!(session = %self.shared.id, "Upload cancel requested");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidekit_core::ports::NoopEmitter;

    fn session() -> UploadSession {
        let config = UploadConfig {
            settle_delay: Duration::ZERO,
            emit_interval: Duration::ZERO,
            ..UploadConfig::default()
        };
        UploadSession::new(config, Arc::new(NoopEmitter::new()))
    }

    #[test]
    fn test_config_from_settings() {
        let config = UploadConfig::default();
        assert!((config.progress_cap - 90.0).abs() < f64::EPSILON);
        assert_eq!(config.settle_delay, Duration::from_millis(400));
        assert_eq!(config.emit_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_throttle_spacing_and_reset() {
        let mut throttle = ProgressThrottle::new(Duration::from_millis(50));
        let start = Instant::now();
        assert!(throttle.admit(start));
        assert!(!throttle.admit(start + Duration::from_millis(20)));
        assert!(throttle.admit(start + Duration::from_millis(60)));

        throttle.reset();
        assert!(throttle.admit(start + Duration::from_millis(61)));
    }

    #[test]
    fn test_zero_interval_admits_every_tick() {
        let mut throttle = ProgressThrottle::new(Duration::ZERO);
        let now = Instant::now();
        assert!(throttle.admit(now));
        assert!(throttle.admit(now));
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let session = session();
        assert!(!session.cancel());
        assert_eq!(session.snapshot().phase, UploadPhase::Idle);
    }

    #[tokio::test]
    async fn test_successful_run_returns_to_idle() {
        let session = session();
        let mut rx = session.subscribe();

        let value = session
            .run(100, |options| async move {
                options.report(50, 100);
                options.report(100, 100);
                Ok::<_, RepositoryError>(7)
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(session.snapshot(), UploadSnapshot::idle());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, UploadPhase::Idle);
    }

    #[tokio::test]
    async fn test_metadata_only_run_has_no_progress_callback() {
        let session = session();
        let had_progress = session
            .run(0, |options| async move {
                Ok::<_, RepositoryError>(options.progress.is_some())
            })
            .await
            .unwrap();
        assert!(!had_progress);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_failure_maps_to_transfer_error() {
        let session = session();
        let err = session
            .run(10, |_| async { Err::<(), _>(RepositoryError::network("boom")) })
            .await
            .unwrap_err();
        assert_eq!(err, UploadError::Transfer(RepositoryError::network("boom")));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_transport_cancelled_error_is_cancellation() {
        let session = session();
        let err = session
            .run(10, |_| async { Err::<(), _>(RepositoryError::Cancelled) })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(session.snapshot().phase, UploadPhase::Idle);
    }
}
