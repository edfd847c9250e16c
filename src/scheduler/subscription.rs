//! Per-slot state subscriptions.
//!
//! A watcher first yields the slot's state at subscription time, then every state the
//! slot is committed to afterwards. It ends once the scheduler is dropped.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::domain::AdLoadState;

/// Buffer per slot channel. A slot changes state at most once per recomputation, so a
/// lagging observer has to fall behind by this many recomputations to miss one.
pub(crate) const SLOT_CHANNEL_CAPACITY: usize = 16;

/// Subscription to one slot's load state
#[derive(Debug)]
pub struct SlotWatcher {
    ad_id: String,
    initial: Option<AdLoadState>,
    rx: broadcast::Receiver<AdLoadState>,
}

impl SlotWatcher {
    pub(crate) fn new(ad_id: String, current: AdLoadState, rx: broadcast::Receiver<AdLoadState>) -> Self {
        Self {
            ad_id,
            initial: Some(current),
            rx,
        }
    }

    pub fn ad_id(&self) -> &str {
        &self.ad_id
    }

    /// Wait for the next state. Returns None once the scheduler is gone.
    pub async fn recv(&mut self) -> Option<AdLoadState> {
        if let Some(state) = self.initial.take() {
            return Some(state);
        }

        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Watcher for {} lagged, skipped {} state(s)", self.ad_id, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next state if one is already available.
    pub fn try_recv(&mut self) -> Option<AdLoadState> {
        if let Some(state) = self.initial.take() {
            return Some(state);
        }

        loop {
            match self.rx.try_recv() {
                Ok(state) => return Some(state),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Watcher for {} lagged, skipped {} state(s)", self.ad_id, skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain everything currently available.
    pub fn drain(&mut self) -> Vec<AdLoadState> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
