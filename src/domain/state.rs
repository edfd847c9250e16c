//! Load state of a single ad slot and the change notifications built from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a slot sits in the lazy loading pipeline.
///
/// `NotLoaded -> Fetched -> Displayed -> Unloaded -> NotLoaded`, with `Fetched` also able
/// to unload directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdLoadState {
    /// Nothing materialized yet (also the state a slot resets to after unloading)
    #[default]
    NotLoaded,
    /// Content requested because the slot is near the viewport
    Fetched,
    /// Slot is on screen and its content should be shown
    Displayed,
    /// Slot left the unload zone long enough ago that its content can go
    Unloaded,
}

impl AdLoadState {
    /// Raw name used in logs and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            AdLoadState::NotLoaded => "notLoaded",
            AdLoadState::Fetched => "fetched",
            AdLoadState::Displayed => "displayed",
            AdLoadState::Unloaded => "unloaded",
        }
    }

    /// Returns true while the slot holds content that an unload would release
    pub fn is_loaded(&self) -> bool {
        matches!(self, AdLoadState::Fetched | AdLoadState::Displayed)
    }
}

impl fmt::Display for AdLoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed transition, as published to feed-wide observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub ad_id: String,
    pub from: AdLoadState,
    pub state: AdLoadState,
}

impl StateChange {
    pub fn new(ad_id: impl Into<String>, from: AdLoadState, state: AdLoadState) -> Self {
        Self {
            ad_id: ad_id.into(),
            from,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_loaded() {
        assert_eq!(AdLoadState::default(), AdLoadState::NotLoaded);
    }

    #[test]
    fn test_display_uses_raw_names() {
        assert_eq!(AdLoadState::NotLoaded.to_string(), "notLoaded");
        assert_eq!(AdLoadState::Fetched.to_string(), "fetched");
        assert_eq!(AdLoadState::Displayed.to_string(), "displayed");
        assert_eq!(AdLoadState::Unloaded.to_string(), "unloaded");
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&AdLoadState::NotLoaded).unwrap();
        assert_eq!(json, "\"notLoaded\"");
        let parsed: AdLoadState = serde_json::from_str("\"displayed\"").unwrap();
        assert_eq!(parsed, AdLoadState::Displayed);
    }

    #[test]
    fn test_is_loaded() {
        assert!(!AdLoadState::NotLoaded.is_loaded());
        assert!(AdLoadState::Fetched.is_loaded());
        assert!(AdLoadState::Displayed.is_loaded());
        assert!(!AdLoadState::Unloaded.is_loaded());
    }

    #[test]
    fn test_state_change_json() {
        let change = StateChange::new("div-gpt-ad-mobile_1", AdLoadState::NotLoaded, AdLoadState::Fetched);
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value["ad_id"], "div-gpt-ad-mobile_1");
        assert_eq!(value["from"], "notLoaded");
        assert_eq!(value["state"], "fetched");
    }
}
