//! A tracked ad placement.

use kurbo::Rect;

use super::AdLoadState;

/// Last known geometry and load state of one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdSlot {
    /// Frame in the container's coordinate space, as last reported
    pub frame: Rect,
    /// Current pipeline state
    pub state: AdLoadState,
}

impl AdSlot {
    /// A freshly reported slot starts out `NotLoaded`
    pub fn new(frame: Rect) -> Self {
        Self {
            frame,
            state: AdLoadState::NotLoaded,
        }
    }
}
