//! Zone thresholds and the zones they produce around a viewport.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::error::{LazySlotError, Result};
use crate::geometry::expand_vertically;

pub const DEFAULT_FETCH_THRESHOLD: f64 = 800.0;
pub const DEFAULT_DISPLAY_THRESHOLD: f64 = 200.0;
/// Larger than the others so slots do not flicker between fetch and unload
pub const DEFAULT_UNLOAD_THRESHOLD: f64 = 1600.0;

/// Distances, in frame units, by which each zone extends the viewport above and below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneThresholds {
    pub fetch: f64,
    pub display: f64,
    pub unload: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            fetch: DEFAULT_FETCH_THRESHOLD,
            display: DEFAULT_DISPLAY_THRESHOLD,
            unload: DEFAULT_UNLOAD_THRESHOLD,
        }
    }
}

impl ZoneThresholds {
    /// Create thresholds, rejecting values that cannot describe a zone.
    ///
    /// Ordering between the three is not checked; see [`ZoneThresholds::has_hysteresis`].
    pub fn new(fetch: f64, display: f64, unload: f64) -> Result<Self> {
        for (name, value) in [("fetch", fetch), ("display", display), ("unload", unload)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LazySlotError::InvalidThresholds(format!(
                    "{} threshold must be a finite, non-negative distance (got {})",
                    name, value
                )));
            }
        }
        Ok(Self { fetch, display, unload })
    }

    /// True when the unload zone contains both the fetch and display zones.
    ///
    /// Without it a slot can be unloaded while still inside its fetch zone and get
    /// re-fetched right away.
    pub fn has_hysteresis(&self) -> bool {
        self.unload >= self.fetch && self.unload >= self.display
    }

    /// Zones around a given viewport
    pub fn zones_for(&self, viewport: Rect) -> Zones {
        Zones {
            viewport,
            fetch: expand_vertically(viewport, self.fetch),
            display: expand_vertically(viewport, self.display),
            unload: expand_vertically(viewport, self.unload),
        }
    }
}

/// The viewport plus the three zones derived from it for one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zones {
    pub viewport: Rect,
    pub fetch: Rect,
    pub display: Rect,
    pub unload: Rect,
}
