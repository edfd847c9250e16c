//! Feed simulator: stands in for a host UI so the scheduler can run end to end.

pub mod feed;
pub mod runner;

pub use feed::{Feed, FeedItem, FeedItemKind, ITEM_SPACING, ad_unit_id};
pub use runner::{Simulation, SimulationReport, TimedChange};
