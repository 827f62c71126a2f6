//! Displayed-progress heuristics for one upload.
//!
//! The transport only knows about bytes on the wire; the server still has
//! to commit the record afterwards. Displayed progress is therefore held at
//! a cap until the request completes, and the ETA is padded by a buffer
//! factor. Both knobs come from `Settings`.

use std::time::Instant;

/// One evaluated progress observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Transport progress (0 - 100), unclamped by the cap.
    pub raw_percent: f64,
    /// Percent to display: capped and never decreasing.
    pub percent: f64,
    /// Bytes per second over the last interval; `None` unless positive.
    pub speed_bytes_per_sec: Option<f64>,
    /// Buffered seconds remaining; `None` unless speed is known.
    pub eta_seconds: Option<f64>,
    /// The transport has sent every byte.
    pub transport_done: bool,
}

/// Turns raw `(transferred, total)` ticks into displayable progress.
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    total_bytes: u64,
    cap: f64,
    eta_buffer: f64,
    displayed: f64,
    last_bytes: u64,
    last_time: Instant,
    speed: Option<f64>,
}

impl ProgressEstimator {
    /// Start estimating an upload of `total_bytes` beginning at `started`.
    pub fn new(total_bytes: u64, cap: f64, eta_buffer: f64, started: Instant) -> Self {
        Self {
            total_bytes,
            cap: cap.clamp(0.0, 100.0),
            eta_buffer: eta_buffer.max(1.0),
            displayed: 0.0,
            last_bytes: 0,
            last_time: started,
            speed: None,
        }
    }

    /// Evaluate a transport tick observed at `now`.
    ///
    /// `total` overrides the declared size when the transport knows better
    /// (multipart framing adds bytes); 0 keeps the declared size.
    pub fn observe(&mut self, transferred: u64, total: u64, now: Instant) -> ProgressSample {
        if total > 0 {
            self.total_bytes = total;
        }
        let total = self.total_bytes;

        #[allow(clippy::cast_precision_loss)]
        let raw_percent = if total == 0 {
            0.0
        } else {
            (transferred as f64 / total as f64 * 100.0).min(100.0)
        };
        self.displayed = self.displayed.max(raw_percent.min(self.cap));

        let elapsed = now.saturating_duration_since(self.last_time).as_secs_f64();
        if elapsed > 0.0 {
            let bytes_delta = transferred.saturating_sub(self.last_bytes);
            #[allow(clippy::cast_precision_loss)]
            let instant_speed = bytes_delta as f64 / elapsed;
            self.speed = (instant_speed > 0.0).then_some(instant_speed);
            self.last_time = now;
        }
        self.last_bytes = self.last_bytes.max(transferred);

        let eta_seconds = self.speed.map(|speed| {
            let remaining = total.saturating_sub(transferred);
            #[allow(clippy::cast_precision_loss)]
            let raw = remaining as f64 / speed;
            raw * self.eta_buffer
        });

        ProgressSample {
            raw_percent,
            percent: self.displayed,
            speed_bytes_per_sec: self.speed,
            eta_seconds,
            transport_done: total > 0 && transferred >= total,
        }
    }

    /// Displayed percent so far.
    pub const fn percent(&self) -> f64 {
        self.displayed
    }

    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}
