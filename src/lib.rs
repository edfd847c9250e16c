//! lazyslot - viewport-driven lazy loading for ad slots in a scrolling feed
//!
//! A host reports each ad slot's frame and the scroll container's visible bounds. The
//! scheduler decides when each slot should be fetched, displayed, and unloaded, and
//! publishes those transitions to whoever renders the slots.

pub mod config;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod renderer;
pub mod scheduler;
pub mod sim;

pub use domain::{AdLoadState, StateChange, ZoneThresholds};
pub use error::{LazySlotError, Result};
pub use scheduler::{LazyLoadScheduler, SchedulerConfig, SlotWatcher};
