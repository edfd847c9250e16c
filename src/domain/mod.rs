//! Domain types for lazyslot
//!
//! - AdLoadState: where a slot sits in the fetch/display/unload pipeline
//! - StateChange: a committed transition, as published to observers
//! - AdSlot: a tracked slot's frame and state
//! - ZoneThresholds / Zones: how far around the viewport each zone reaches

pub mod slot;
pub mod state;
pub mod zones;

pub use slot::AdSlot;
pub use state::{AdLoadState, StateChange};
pub use zones::{
    DEFAULT_DISPLAY_THRESHOLD, DEFAULT_FETCH_THRESHOLD, DEFAULT_UNLOAD_THRESHOLD, ZoneThresholds, Zones,
};
