//! Scroll script that drives a scheduler the way a host's layout pass would.
//!
//! Slot frames are reported once in content coordinates; the viewport moves with the
//! scroll offset and is reported every frame.

use std::time::Duration;

use kurbo::Rect;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::config::SimulationConfig;
use crate::domain::{AdLoadState, StateChange};
use crate::geometry::frame;
use crate::scheduler::LazyLoadScheduler;
use crate::sim::feed::Feed;

/// Time allowed after the last frame for a trailing recomputation.
const SETTLE_TIME: Duration = Duration::from_millis(250);

/// A state change stamped with the simulation time it was observed at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedChange {
    pub at_ms: u64,
    #[serde(flatten)]
    pub change: StateChange,
}

/// What happened during a run.
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub frames: usize,
    pub checks_run: u64,
    pub changes: Vec<TimedChange>,
}

impl SimulationReport {
    /// States one slot went through, in order.
    pub fn history(&self, ad_id: &str) -> Vec<AdLoadState> {
        self.changes
            .iter()
            .filter(|timed| timed.change.ad_id == ad_id)
            .map(|timed| timed.change.state)
            .collect()
    }

    /// Number of changes that landed in `state`.
    pub fn count(&self, state: AdLoadState) -> usize {
        self.changes.iter().filter(|timed| timed.change.state == state).count()
    }
}

/// Scroll the feed down to the bottom, dwell, and scroll back to the top.
#[derive(Debug, Clone)]
pub struct Simulation {
    feed: Feed,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(feed: Feed, config: SimulationConfig) -> Self {
        Self { feed, config }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Visible bounds at a scroll offset.
    pub fn viewport_at(&self, offset: f64) -> Rect {
        frame(0.0, offset, self.config.viewport_width, self.config.viewport_height)
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.config.frame_interval_ms.max(1))
    }

    /// Scroll offset for every frame of the run.
    pub fn scroll_plan(&self) -> Vec<f64> {
        let max = self.feed.max_scroll(self.config.viewport_height);
        let step = (self.config.scroll_speed * self.frame_interval().as_secs_f64()).max(1.0);

        let mut down = Vec::new();
        let mut offset = 0.0;
        while offset < max {
            down.push(offset);
            offset += step;
        }
        down.push(max);

        let dwell_frames = (self.config.dwell_ms / self.frame_interval().as_millis() as u64) as usize;
        let mut plan = down.clone();
        plan.extend(std::iter::repeat_n(max, dwell_frames));
        plan.extend(down.into_iter().rev());
        plan
    }

    /// Run the scroll script against `scheduler`, which is dropped at the end.
    ///
    /// `on_change` sees each change as soon as it is observed.
    pub async fn run<F>(&self, scheduler: LazyLoadScheduler, mut on_change: F) -> SimulationReport
    where
        F: FnMut(&TimedChange),
    {
        let started = Instant::now();
        let mut events = scheduler.subscribe_all();
        let mut report = SimulationReport::default();

        let mut collect = |events: &mut broadcast::Receiver<StateChange>, report: &mut SimulationReport| {
            while let Ok(change) = events.try_recv() {
                let timed = TimedChange {
                    at_ms: started.elapsed().as_millis() as u64,
                    change,
                };
                on_change(&timed);
                report.changes.push(timed);
            }
        };

        for (ad_id, slot_frame) in self.feed.ad_slots() {
            scheduler.report_slot_frame(ad_id, slot_frame);
        }

        let plan = self.scroll_plan();
        log::info!(
            "Simulating {} frames over {} ad slots",
            plan.len(),
            self.feed.ad_slots().count()
        );

        for offset in plan {
            scheduler.report_viewport_bounds(self.viewport_at(offset));
            report.frames += 1;
            tokio::time::sleep(self.frame_interval()).await;
            collect(&mut events, &mut report);
        }

        tokio::time::sleep(SETTLE_TIME).await;
        collect(&mut events, &mut report);

        report.checks_run = scheduler.checks_run();
        drop(scheduler);
        report
    }
}
