//! Visibility tracker: the per-slot state machine.
//!
//! The tracker owns every slot's frame and state, the viewport, the zone thresholds and
//! the unload candidacy timestamps. One call to [`VisibilityTracker::evaluate`] applies
//! at most one transition per slot and returns the transitions it committed.
//!
//! Rules, checked in order for each slot:
//! 1. `NotLoaded -> Fetched` when the frame intersects the fetch zone.
//! 2. `Fetched -> Displayed` when the frame intersects the display zone and the viewport.
//! 3. `Fetched | Displayed -> Unloaded` when the frame is outside the unload zone, but
//!    only after it has stayed outside for the stability delay.
//! 4. `Unloaded -> NotLoaded` when the frame intersects the fetch zone again.
//! 5. Anything else clears a pending candidacy.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use kurbo::Rect;

use crate::domain::{AdLoadState, AdSlot, StateChange, ZoneThresholds, Zones};
use crate::geometry::{intersects, is_degenerate};

/// Default time a slot must stay outside the unload zone before it unloads.
pub const DEFAULT_UNLOAD_STABILITY_DELAY: Duration = Duration::from_secs(2);

/// What a single rule evaluation wants done with the slot's unload candidacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidacy {
    Keep,
    Mark,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    next: Option<AdLoadState>,
    candidacy: Candidacy,
}

impl Step {
    fn to(state: AdLoadState) -> Self {
        Self {
            next: Some(state),
            candidacy: Candidacy::Clear,
        }
    }

    fn stay(candidacy: Candidacy) -> Self {
        Self { next: None, candidacy }
    }
}

/// Decide the next step for one slot.
fn step(
    current: AdLoadState,
    frame: Rect,
    zones: &Zones,
    candidate_since: Option<Instant>,
    now: Instant,
    stability_delay: Duration,
) -> Step {
    match current {
        AdLoadState::NotLoaded if intersects(frame, zones.fetch) => Step::to(AdLoadState::Fetched),
        AdLoadState::Fetched if intersects(frame, zones.display) && intersects(frame, zones.viewport) => {
            Step::to(AdLoadState::Displayed)
        }
        AdLoadState::Fetched | AdLoadState::Displayed if !intersects(frame, zones.unload) => match candidate_since {
            None => Step::stay(Candidacy::Mark),
            Some(since) if now.saturating_duration_since(since) >= stability_delay => Step::to(AdLoadState::Unloaded),
            Some(_) => Step::stay(Candidacy::Keep),
        },
        AdLoadState::Unloaded if intersects(frame, zones.fetch) => Step::to(AdLoadState::NotLoaded),
        _ => Step::stay(Candidacy::Clear),
    }
}

/// Owns all slot state; pure apart from the `now` passed in.
#[derive(Debug)]
pub struct VisibilityTracker {
    slots: BTreeMap<String, AdSlot>,
    viewport: Rect,
    thresholds: ZoneThresholds,
    unload_candidates: HashMap<String, Instant>,
    stability_delay: Duration,
}

impl VisibilityTracker {
    pub fn new(thresholds: ZoneThresholds, stability_delay: Duration) -> Self {
        Self {
            slots: BTreeMap::new(),
            viewport: Rect::ZERO,
            thresholds,
            unload_candidates: HashMap::new(),
            stability_delay,
        }
    }

    pub fn thresholds(&self) -> ZoneThresholds {
        self.thresholds
    }

    /// Replace the zone thresholds. Takes effect on the next evaluation.
    pub fn set_thresholds(&mut self, thresholds: ZoneThresholds) {
        self.thresholds = thresholds;
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn stability_delay(&self) -> Duration {
        self.stability_delay
    }

    /// Current state of a slot; slots never reported are `NotLoaded`.
    pub fn state(&self, ad_id: &str) -> AdLoadState {
        self.slots.get(ad_id).map(|slot| slot.state).unwrap_or_default()
    }

    pub fn slot(&self, ad_id: &str) -> Option<&AdSlot> {
        self.slots.get(ad_id)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn unload_candidate_count(&self) -> usize {
        self.unload_candidates.len()
    }

    pub fn is_unload_candidate(&self, ad_id: &str) -> bool {
        self.unload_candidates.contains_key(ad_id)
    }

    /// Record a slot's frame. Returns false when nothing changed.
    pub fn set_frame(&mut self, ad_id: &str, frame: Rect) -> bool {
        match self.slots.get_mut(ad_id) {
            Some(slot) if slot.frame == frame => false,
            Some(slot) => {
                slot.frame = frame;
                true
            }
            None => {
                self.slots.insert(ad_id.to_string(), AdSlot::new(frame));
                true
            }
        }
    }

    /// Record the container's visible bounds. Returns false when nothing changed.
    pub fn set_viewport(&mut self, viewport: Rect) -> bool {
        if self.viewport == viewport {
            return false;
        }
        self.viewport = viewport;
        true
    }

    /// Drop everything known about a slot. Returns the state it was in, if tracked.
    pub fn forget(&mut self, ad_id: &str) -> Option<AdLoadState> {
        self.unload_candidates.remove(ad_id);
        self.slots.remove(ad_id).map(|slot| slot.state)
    }

    /// Run one visibility check at `now` and return the transitions it committed.
    ///
    /// Skipped entirely while the viewport has no area.
    pub fn evaluate(&mut self, now: Instant) -> Vec<StateChange> {
        if is_degenerate(self.viewport) {
            tracing::debug!("Visibility check skipped: viewport is empty");
            return Vec::new();
        }

        let zones = self.thresholds.zones_for(self.viewport);
        let mut changes = Vec::new();

        for (ad_id, slot) in self.slots.iter_mut() {
            let current = slot.state;
            let candidate_since = self.unload_candidates.get(ad_id).copied();
            let outcome = step(current, slot.frame, &zones, candidate_since, now, self.stability_delay);

            match outcome.candidacy {
                Candidacy::Keep => {}
                Candidacy::Mark => {
                    self.unload_candidates.insert(ad_id.clone(), now);
                    tracing::debug!(ad_id = %ad_id, state = %current, "Marked as unload candidate");
                }
                Candidacy::Clear => {
                    self.unload_candidates.remove(ad_id);
                }
            }

            if let Some(next) = outcome.next.filter(|next| *next != current) {
                tracing::debug!(ad_id = %ad_id, from = %current, to = %next, "Transition");
                slot.state = next;
                changes.push(StateChange::new(ad_id.clone(), current, next));
            }
        }

        changes
    }
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new(ZoneThresholds::default(), DEFAULT_UNLOAD_STABILITY_DELAY)
    }
}
