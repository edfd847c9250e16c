//! Lazy load scheduler integration tests
//!
//! Drives the public scheduler API on a paused tokio clock so the throttle interval and
//! unload stability delay are exercised deterministically.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lazyslot::config::SimulationConfig;
use lazyslot::geometry::frame;
use lazyslot::renderer::{SlotRenderer, drive_renderer};
use lazyslot::sim::{Feed, Simulation};
use lazyslot::{AdLoadState, LazyLoadScheduler, SchedulerConfig, StateChange, ZoneThresholds};

const AD: &str = "div-gpt-ad-mobile_2";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Let any armed recomputation fire and clear the throttle window.
async fn settle() {
    tokio::time::sleep(ms(100)).await;
}

/// Scheduler with the viewport (0,0,400,800) already reported.
async fn scheduler_with_viewport() -> LazyLoadScheduler {
    let scheduler = LazyLoadScheduler::with_defaults().unwrap();
    scheduler.report_viewport_bounds(frame(0.0, 0.0, 400.0, 800.0));
    settle().await;
    scheduler
}

/// Report a frame and let the resulting check run.
async fn move_slot(scheduler: &LazyLoadScheduler, y: f64) {
    scheduler.report_slot_frame(AD, frame(0.0, y, 400.0, 300.0));
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_fetch_zone_scenario() {
    let scheduler = scheduler_with_viewport().await;
    let mut watcher = scheduler.observe_state(AD);

    // Fetch zone spans y -800..1600; the slot at 1000..1300 is inside it
    move_slot(&scheduler, 1000.0).await;
    assert_eq!(scheduler.state(AD), AdLoadState::Fetched);

    // 850..1150 reaches the display zone (-200..1000) but not the viewport (0..800)
    move_slot(&scheduler, 850.0).await;
    scheduler.request_check();
    settle().await;
    assert_eq!(scheduler.state(AD), AdLoadState::Fetched);

    assert_eq!(watcher.drain(), vec![AdLoadState::NotLoaded, AdLoadState::Fetched]);
}

#[tokio::test(start_paused = true)]
async fn test_display_on_next_check() {
    let scheduler = scheduler_with_viewport().await;
    move_slot(&scheduler, 1000.0).await;

    move_slot(&scheduler, 600.0).await;

    assert_eq!(scheduler.state(AD), AdLoadState::Displayed);
}

#[tokio::test(start_paused = true)]
async fn test_unload_after_stability_delay() {
    let scheduler = scheduler_with_viewport().await;
    move_slot(&scheduler, 100.0).await;
    scheduler.request_check();
    settle().await;
    assert_eq!(scheduler.state(AD), AdLoadState::Displayed);

    // Unload zone spans -1600..2400
    move_slot(&scheduler, 3000.0).await;
    assert_eq!(scheduler.unload_candidate_count(), 1);
    assert_eq!(scheduler.state(AD), AdLoadState::Displayed);

    tokio::time::sleep(ms(2000)).await;
    scheduler.request_check();

    assert_eq!(scheduler.state(AD), AdLoadState::Unloaded);
    assert_eq!(scheduler.unload_candidate_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_safe_report_resets_unload_deadline() {
    let scheduler = scheduler_with_viewport().await;
    move_slot(&scheduler, 100.0).await;
    scheduler.request_check();
    settle().await;

    // Candidate at ~t0
    move_slot(&scheduler, 3000.0).await;
    tokio::time::sleep(ms(900)).await;

    // Back inside the unload zone, then out again
    move_slot(&scheduler, 2000.0).await;
    assert_eq!(scheduler.unload_candidate_count(), 0);
    move_slot(&scheduler, 3000.0).await;

    // The original deadline passes without an unload
    tokio::time::sleep(ms(1100)).await;
    scheduler.request_check();
    assert_eq!(scheduler.state(AD), AdLoadState::Displayed);

    tokio::time::sleep(ms(1000)).await;
    scheduler.request_check();
    assert_eq!(scheduler.state(AD), AdLoadState::Unloaded);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_geometry_emits_nothing() {
    let scheduler = scheduler_with_viewport().await;
    move_slot(&scheduler, 100.0).await;
    scheduler.request_check();
    settle().await;
    let mut events = scheduler.subscribe_all();

    for _ in 0..5 {
        scheduler.request_check();
        settle().await;
    }
    move_slot(&scheduler, 100.0).await;

    assert!(events.try_recv().is_err());
    assert_eq!(scheduler.state(AD), AdLoadState::Displayed);
}

#[tokio::test(start_paused = true)]
async fn test_round_trip_repeats_same_notifications() {
    let scheduler = scheduler_with_viewport().await;
    let mut watcher = scheduler.observe_state(AD);
    assert_eq!(watcher.try_recv(), Some(AdLoadState::NotLoaded));

    let mut cycles = Vec::new();
    for _ in 0..2 {
        move_slot(&scheduler, 1200.0).await; // fetch (or reset after unload)
        move_slot(&scheduler, 1190.0).await; // fetch after reset
        move_slot(&scheduler, 100.0).await; // on screen
        move_slot(&scheduler, 5000.0).await; // far away: candidate
        tokio::time::sleep(ms(2000)).await;
        scheduler.request_check();
        settle().await;
        assert_eq!(scheduler.unload_candidate_count(), 0);
        cycles.push(watcher.drain());
    }

    assert_eq!(
        cycles[0],
        vec![AdLoadState::Fetched, AdLoadState::Displayed, AdLoadState::Unloaded]
    );
    assert_eq!(
        cycles[1],
        vec![
            AdLoadState::NotLoaded,
            AdLoadState::Fetched,
            AdLoadState::Displayed,
            AdLoadState::Unloaded
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_throttle_coalesces_burst() {
    let scheduler = scheduler_with_viewport().await;
    move_slot(&scheduler, 5000.0).await;
    let baseline = scheduler.checks_run();

    // First report runs right away, the rest of the burst within the interval coalesce
    for i in 0..10 {
        scheduler.report_viewport_bounds(frame(0.0, 10.0 * (i + 1) as f64, 400.0, 800.0));
        tokio::time::advance(ms(5)).await;
    }
    scheduler.report_viewport_bounds(frame(0.0, 4000.0, 400.0, 800.0));

    assert_eq!(scheduler.checks_run(), baseline + 1);
    assert!(scheduler.has_pending_check());
    assert_eq!(scheduler.state(AD), AdLoadState::NotLoaded);

    settle().await;

    // Exactly one trailing check, and it saw the latest viewport
    assert_eq!(scheduler.checks_run(), baseline + 2);
    assert!(!scheduler.has_pending_check());
    assert_eq!(scheduler.state(AD), AdLoadState::Fetched);
}

#[tokio::test(start_paused = true)]
async fn test_deferred_check_fires_at_interval_boundary() {
    let config = SchedulerConfig::default().with_throttle_interval(ms(200));
    let scheduler = LazyLoadScheduler::new(config).unwrap();
    scheduler.report_viewport_bounds(frame(0.0, 0.0, 400.0, 800.0));
    scheduler.report_slot_frame(AD, frame(0.0, 100.0, 400.0, 300.0));
    assert_eq!(scheduler.checks_run(), 1);

    tokio::time::sleep(ms(199)).await;
    assert_eq!(scheduler.checks_run(), 1);
    assert_eq!(scheduler.state(AD), AdLoadState::NotLoaded);

    tokio::time::sleep(ms(2)).await;
    assert_eq!(scheduler.checks_run(), 2);
    assert_eq!(scheduler.state(AD), AdLoadState::Fetched);
}

#[tokio::test(start_paused = true)]
async fn test_empty_viewport_skips_checks() {
    let scheduler = LazyLoadScheduler::with_defaults().unwrap();
    scheduler.report_slot_frame(AD, frame(0.0, 100.0, 400.0, 300.0));
    settle().await;
    scheduler.request_check();
    settle().await;

    assert_eq!(scheduler.checks_run(), 0);
    assert_eq!(scheduler.state(AD), AdLoadState::NotLoaded);
}

#[tokio::test(start_paused = true)]
async fn test_configure_then_request_check() {
    let scheduler = scheduler_with_viewport().await;
    move_slot(&scheduler, 1800.0).await;
    assert_eq!(scheduler.state(AD), AdLoadState::NotLoaded);

    scheduler.configure(ZoneThresholds::new(1200.0, 200.0, 2400.0).unwrap());
    assert_eq!(scheduler.state(AD), AdLoadState::NotLoaded);

    scheduler.request_check();
    settle().await;
    assert_eq!(scheduler.state(AD), AdLoadState::Fetched);
}

#[tokio::test(start_paused = true)]
async fn test_feed_wide_events_follow_slot_order() {
    let scheduler = LazyLoadScheduler::with_defaults().unwrap();
    let mut events = scheduler.subscribe_all();

    // Both slots are known before the first real check
    scheduler.report_slot_frame("b", frame(0.0, 1400.0, 400.0, 300.0));
    scheduler.report_slot_frame("a", frame(0.0, 100.0, 400.0, 300.0));
    scheduler.report_viewport_bounds(frame(0.0, 0.0, 400.0, 800.0));
    settle().await;

    assert_eq!(
        events.try_recv().unwrap(),
        StateChange::new("a", AdLoadState::NotLoaded, AdLoadState::Fetched)
    );
    assert_eq!(
        events.try_recv().unwrap(),
        StateChange::new("b", AdLoadState::NotLoaded, AdLoadState::Fetched)
    );
    assert!(events.try_recv().is_err());
}

#[derive(Default)]
struct CountingRenderer {
    calls: Mutex<Vec<(String, &'static str)>>,
}

#[async_trait]
impl SlotRenderer for CountingRenderer {
    async fn materialize(&self, ad_id: &str) {
        self.calls.lock().unwrap().push((ad_id.to_string(), "materialize"));
    }

    async fn render(&self, ad_id: &str) {
        self.calls.lock().unwrap().push((ad_id.to_string(), "render"));
    }

    async fn tear_down(&self, ad_id: &str) {
        self.calls.lock().unwrap().push((ad_id.to_string(), "tear_down"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_simulated_scroll_cycles_banner_ad() {
    let config = SimulationConfig::default();
    let simulation = Simulation::new(Feed::build(&config), config);
    let scheduler = LazyLoadScheduler::with_defaults().unwrap();
    let renderer = CountingRenderer::default();
    let events = scheduler.subscribe_all();

    let (report, dispatched) = tokio::join!(simulation.run(scheduler, |_| {}), drive_renderer(events, &renderer));

    assert_eq!(dispatched, report.changes.len());
    assert_eq!(
        report.history("div-gpt-ad-mobile_1"),
        vec![
            AdLoadState::Fetched,
            AdLoadState::Displayed,
            AdLoadState::Unloaded,
            AdLoadState::NotLoaded,
            AdLoadState::Fetched,
            AdLoadState::Displayed,
        ]
    );

    // Every slot is on screen at some point on the way down
    for (ad_id, _) in simulation.feed().ad_slots() {
        assert!(
            report.history(ad_id).contains(&AdLoadState::Displayed),
            "{ad_id} was never displayed"
        );
    }

    let calls = renderer.calls.lock().unwrap();
    assert!(calls.contains(&("div-gpt-ad-mobile_1".to_string(), "tear_down")));
    assert!(report.checks_run > 0);
}
