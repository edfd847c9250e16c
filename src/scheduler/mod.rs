//! Visibility scheduling for lazily loaded ad slots.
//!
//! This module provides:
//! - **Tracker**: the per-slot state machine that turns geometry into transitions.
//! - **Throttle**: bounded recomputation rate with a trailing run for the latest input.
//! - **LazyLoadScheduler**: the public facade that owns both, arms deferred
//!   recomputations on the tokio runtime and publishes state changes.
//! - **SlotWatcher**: per-slot subscriptions that start from the current state.
//!
//! # Example
//!
//! ```ignore
//! use lazyslot::geometry::frame;
//! use lazyslot::scheduler::LazyLoadScheduler;
//!
//! let scheduler = LazyLoadScheduler::with_defaults()?;
//! let mut watcher = scheduler.observe_state("div-gpt-ad-mobile_1");
//!
//! scheduler.report_viewport_bounds(frame(0.0, 0.0, 400.0, 800.0));
//! scheduler.report_slot_frame("div-gpt-ad-mobile_1", frame(0.0, 1000.0, 400.0, 300.0));
//!
//! while let Some(state) = watcher.recv().await {
//!     println!("{state}");
//! }
//! ```

mod lazy_load;
mod subscription;
mod throttle;
mod tracker;

pub use lazy_load::{LazyLoadScheduler, SchedulerConfig};
pub use subscription::SlotWatcher;
pub use throttle::{DEFAULT_THROTTLE_INTERVAL, Throttle, ThrottleDecision};
pub use tracker::{DEFAULT_UNLOAD_STABILITY_DELAY, VisibilityTracker};
