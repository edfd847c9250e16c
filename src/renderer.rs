//! Ad slot renderer seam.
//!
//! The scheduler never fetches or draws anything. A renderer reacts to committed
//! transitions: create content when a slot is fetched, show it when displayed, and
//! release it when unloaded.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::{AdLoadState, StateChange};

/// Host-side content owner for ad slots
#[async_trait]
pub trait SlotRenderer: Send + Sync {
    /// Create the slot's content (e.g. start loading its web view).
    async fn materialize(&self, ad_id: &str);

    /// The slot is on screen.
    async fn render(&self, ad_id: &str);

    /// Release the slot's content.
    async fn tear_down(&self, ad_id: &str);

    /// The slot was reset after unloading and will be fetched again when near.
    async fn reset(&self, _ad_id: &str) {}
}

/// Dispatch one change to the renderer.
pub async fn dispatch<R: SlotRenderer + ?Sized>(renderer: &R, change: &StateChange) {
    match change.state {
        AdLoadState::Fetched => renderer.materialize(&change.ad_id).await,
        AdLoadState::Displayed => renderer.render(&change.ad_id).await,
        AdLoadState::Unloaded => renderer.tear_down(&change.ad_id).await,
        AdLoadState::NotLoaded => renderer.reset(&change.ad_id).await,
    }
}

/// Feed changes to `renderer` until the scheduler goes away.
///
/// Returns the number of changes dispatched.
pub async fn drive_renderer<R: SlotRenderer + ?Sized>(
    mut events: broadcast::Receiver<StateChange>,
    renderer: &R,
) -> usize {
    let mut dispatched = 0;
    loop {
        match events.recv().await {
            Ok(change) => {
                dispatch(renderer, &change).await;
                dispatched += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("Renderer fell behind, skipped {} change(s)", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    log::debug!("Renderer driver finished after {} change(s)", dispatched);
    dispatched
}
