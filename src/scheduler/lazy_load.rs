//! Lazy load scheduler: the public facade over the tracker and throttle.
//!
//! Geometry reports update the tracker and request a recomputation through the
//! throttle. Deferred recomputations run on the tokio runtime the scheduler was created
//! in and hold only a weak reference to the scheduler state, so a dropped scheduler
//! never gets called back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use kurbo::Rect;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::{AdLoadState, StateChange, ZoneThresholds};
use crate::error::{LazySlotError, Result};
use crate::scheduler::subscription::{SLOT_CHANNEL_CAPACITY, SlotWatcher};
use crate::scheduler::throttle::{DEFAULT_THROTTLE_INTERVAL, Throttle, ThrottleDecision};
use crate::scheduler::tracker::{DEFAULT_UNLOAD_STABILITY_DELAY, VisibilityTracker};

/// Capacity of the feed-wide change broadcast.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for a [`LazyLoadScheduler`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Zone widths around the viewport.
    pub thresholds: ZoneThresholds,
    /// Minimum spacing between two recomputations.
    pub throttle_interval: Duration,
    /// How long a slot must stay outside the unload zone before unloading.
    pub unload_stability_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thresholds: ZoneThresholds::default(),
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            unload_stability_delay: DEFAULT_UNLOAD_STABILITY_DELAY,
        }
    }
}

impl SchedulerConfig {
    /// Set the zone thresholds.
    pub fn with_thresholds(mut self, thresholds: ZoneThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the throttle interval.
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    /// Set the unload stability delay.
    pub fn with_unload_stability_delay(mut self, delay: Duration) -> Self {
        self.unload_stability_delay = delay;
        self
    }
}

/// State shared between the scheduler handle and its deferred recomputation.
struct Inner {
    tracker: VisibilityTracker,
    throttle: Throttle,
    /// Per-slot channels for live watchers. Dropped once their last watcher goes away.
    slot_channels: HashMap<String, broadcast::Sender<AdLoadState>>,
    events: broadcast::Sender<StateChange>,
    /// The armed deferred recomputation, if any.
    pending_check: Option<JoinHandle<()>>,
    /// Identifies the armed deferred recomputation; bumped whenever one is armed or superseded.
    check_epoch: u64,
    /// Set when the scheduler handle is dropped.
    closed: bool,
    /// Number of recomputations that actually evaluated slots.
    checks_run: u64,
}

impl Inner {
    /// Cancel the armed deferred recomputation, if any.
    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending_check.take() {
            handle.abort();
        }
        self.check_epoch += 1;
    }

    fn prune_channels(&mut self) {
        self.slot_channels.retain(|_, tx| tx.receiver_count() > 0);
    }

    fn run_check(&mut self, now: Instant) {
        self.prune_channels();

        if crate::geometry::is_degenerate(self.tracker.viewport()) {
            log::debug!("Skipping visibility check: viewport is empty");
            return;
        }

        self.checks_run += 1;
        let changes = self.tracker.evaluate(now.into_std());

        for change in changes {
            log::debug!("Ad {} TRANSITION: {} -> {}", change.ad_id, change.from, change.state);
            if let Some(tx) = self.slot_channels.get(&change.ad_id) {
                // No receivers is fine
                let _ = tx.send(change.state);
            }
            let _ = self.events.send(change);
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decides, per ad slot, when to fetch, display and unload its content.
///
/// Must be created inside a tokio runtime; deferred recomputations are spawned on it.
pub struct LazyLoadScheduler {
    inner: Arc<Mutex<Inner>>,
    runtime: Handle,
}

impl LazyLoadScheduler {
    /// Create a scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| LazySlotError::NoRuntime(e.to_string()))?;

        if !config.thresholds.has_hysteresis() {
            log::warn!(
                "Unload threshold {} is smaller than fetch/display thresholds {}/{}; slots may flicker",
                config.thresholds.unload,
                config.thresholds.fetch,
                config.thresholds.display
            );
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let inner = Inner {
            tracker: VisibilityTracker::new(config.thresholds, config.unload_stability_delay),
            throttle: Throttle::new(config.throttle_interval),
            slot_channels: HashMap::new(),
            events,
            pending_check: None,
            check_epoch: 0,
            closed: false,
            checks_run: 0,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            runtime,
        })
    }

    /// Create a scheduler with default thresholds and timing.
    pub fn with_defaults() -> Result<Self> {
        Self::new(SchedulerConfig::default())
    }

    /// Update a slot's geometry. Unchanged frames are ignored.
    pub fn report_slot_frame(&self, ad_id: &str, frame: Rect) {
        let mut inner = lock(&self.inner);
        if inner.tracker.set_frame(ad_id, frame) {
            self.trigger(&mut inner);
        }
    }

    /// Update the container's visible bounds. Unchanged bounds are ignored.
    pub fn report_viewport_bounds(&self, bounds: Rect) {
        let mut inner = lock(&self.inner);
        if inner.tracker.set_viewport(bounds) {
            self.trigger(&mut inner);
        }
    }

    /// Subscribe to one slot's state, starting with its current value.
    ///
    /// A slot's channel lives as long as it has watchers, so observing ids that are never
    /// reported does not accumulate state.
    pub fn observe_state(&self, ad_id: &str) -> SlotWatcher {
        let mut inner = lock(&self.inner);
        inner.prune_channels();
        let current = inner.tracker.state(ad_id);
        let rx = inner
            .slot_channels
            .entry(ad_id.to_string())
            .or_insert_with(|| broadcast::channel(SLOT_CHANNEL_CAPACITY).0)
            .subscribe();
        SlotWatcher::new(ad_id.to_string(), current, rx)
    }

    /// Subscribe to every committed transition across all slots.
    pub fn subscribe_all(&self) -> broadcast::Receiver<StateChange> {
        lock(&self.inner).events.subscribe()
    }

    /// Replace the zone thresholds. Does not trigger a recomputation by itself.
    pub fn configure(&self, thresholds: ZoneThresholds) {
        if !thresholds.has_hysteresis() {
            log::warn!(
                "Unload threshold {} is smaller than fetch/display thresholds {}/{}; slots may flicker",
                thresholds.unload,
                thresholds.fetch,
                thresholds.display
            );
        }
        lock(&self.inner).tracker.set_thresholds(thresholds);
    }

    /// Request a throttled recomputation against the current geometry.
    pub fn request_check(&self) {
        let mut inner = lock(&self.inner);
        self.trigger(&mut inner);
    }

    /// Stop tracking a slot whose owning view went away.
    ///
    /// Its watchers end; no transition is published.
    pub fn forget_slot(&self, ad_id: &str) -> Option<AdLoadState> {
        let mut inner = lock(&self.inner);
        inner.slot_channels.remove(ad_id);
        inner.tracker.forget(ad_id)
    }

    /// Snapshot of a slot's state; unknown slots are `NotLoaded`.
    pub fn state(&self, ad_id: &str) -> AdLoadState {
        lock(&self.inner).tracker.state(ad_id)
    }

    pub fn thresholds(&self) -> ZoneThresholds {
        lock(&self.inner).tracker.thresholds()
    }

    pub fn viewport(&self) -> Rect {
        lock(&self.inner).tracker.viewport()
    }

    pub fn slot_count(&self) -> usize {
        lock(&self.inner).tracker.slot_count()
    }

    pub fn unload_candidate_count(&self) -> usize {
        lock(&self.inner).tracker.unload_candidate_count()
    }

    /// Check if a deferred recomputation is armed.
    pub fn has_pending_check(&self) -> bool {
        lock(&self.inner).throttle.is_pending()
    }

    /// Number of recomputations that evaluated slots so far.
    pub fn checks_run(&self) -> u64 {
        lock(&self.inner).checks_run
    }

    /// Run now, arm one deferred recomputation, or coalesce into the armed one.
    fn trigger(&self, inner: &mut Inner) {
        let now = Instant::now();
        match inner.throttle.request(now.into_std()) {
            ThrottleDecision::RunNow => {
                if inner.pending_check.is_some() {
                    tracing::trace!("Immediate visibility check supersedes the deferred one");
                    inner.cancel_pending();
                }
                inner.run_check(now);
            }
            ThrottleDecision::Defer(delay) => {
                tracing::trace!(delay_ms = delay.as_millis() as u64, "Deferring visibility check");
                inner.check_epoch += 1;
                let weak = Arc::downgrade(&self.inner);
                let epoch = inner.check_epoch;
                inner.pending_check = Some(self.runtime.spawn(deferred_check(weak, delay, epoch)));
            }
            ThrottleDecision::Coalesced => {}
        }
    }
}

/// One-shot deferred recomputation armed as `epoch`.
async fn deferred_check(inner: Weak<Mutex<Inner>>, delay: Duration, epoch: u64) {
    tokio::time::sleep(delay).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut inner = lock(&inner);
    if inner.closed || inner.check_epoch != epoch {
        return;
    }
    let now = Instant::now();
    inner.pending_check = None;
    inner.throttle.fire(now.into_std());
    inner.run_check(now);
}

impl Drop for LazyLoadScheduler {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        inner.closed = true;
        if inner.pending_check.is_some() {
            inner.cancel_pending();
            inner.throttle.disarm();
        }
    }
}

impl std::fmt::Debug for LazyLoadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("LazyLoadScheduler")
            .field("slots", &inner.tracker.slot_count())
            .field("viewport", &inner.tracker.viewport())
            .field("thresholds", &inner.tracker.thresholds())
            .field("pending_check", &inner.throttle.is_pending())
            .finish()
    }
}
