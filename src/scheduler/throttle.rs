//! Throttle state for visibility recomputation.
//!
//! Geometry reports can arrive every scroll frame. The throttle bounds how often a
//! recomputation runs and guarantees the latest geometry is evaluated once the interval
//! has passed. The clock is injected so callers decide what `now` means.

use std::time::{Duration, Instant};

/// Default minimum spacing between recomputations (~15 per second).
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(67);

/// What the caller should do with a recomputation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Recompute now; the run has already been recorded.
    RunNow,
    /// Arm a single deferred recomputation after this delay.
    Defer(Duration),
    /// A deferred recomputation is already armed and will pick up the latest state.
    Coalesced,
}

/// Rate limiter with a trailing run.
#[derive(Debug)]
pub struct Throttle {
    /// Minimum time between two recomputations.
    interval: Duration,
    /// When the last recomputation ran (None = never).
    last_run: Option<Instant>,
    /// Whether a deferred recomputation is armed.
    pending: bool,
}

impl Throttle {
    /// Create a throttle with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    /// Check if a deferred recomputation is armed.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Ask for a recomputation at `now`.
    ///
    /// Once the interval has elapsed the request runs now, superseding any armed run.
    /// Inside the interval the first request arms a deferred run and later ones coalesce
    /// into it.
    pub fn request(&mut self, now: Instant) -> ThrottleDecision {
        let elapsed = self.last_run.map(|last| now.saturating_duration_since(last));
        match elapsed {
            Some(elapsed) if elapsed < self.interval => {
                if self.pending {
                    return ThrottleDecision::Coalesced;
                }
                self.pending = true;
                ThrottleDecision::Defer(self.interval - elapsed)
            }
            _ => {
                self.pending = false;
                self.last_run = Some(now);
                ThrottleDecision::RunNow
            }
        }
    }

    /// Record that the deferred recomputation fired at `now`.
    ///
    /// Disarms the pending flag before the caller evaluates, so a report made during the
    /// evaluation can arm the next one.
    pub fn fire(&mut self, now: Instant) {
        self.pending = false;
        self.last_run = Some(now);
    }

    /// Forget an armed deferred run that will never fire.
    pub fn disarm(&mut self) {
        self.pending = false;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_INTERVAL)
    }
}
