//! Terminal renderer for the simulation: prints what a host would do with each slot.

use async_trait::async_trait;
use colored::*;
use tokio::time::Instant;

use lazyslot::renderer::SlotRenderer;

pub struct ConsoleRenderer {
    started: Instant,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    fn print(&self, action: ColoredString, ad_id: &str) {
        println!("[{:>6} ms] {:<12} {}", self.elapsed_ms(), action, ad_id);
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlotRenderer for ConsoleRenderer {
    async fn materialize(&self, ad_id: &str) {
        self.print("materialize".cyan(), ad_id);
    }

    async fn render(&self, ad_id: &str) {
        self.print("render".green(), ad_id);
    }

    async fn tear_down(&self, ad_id: &str) {
        self.print("tear down".red(), ad_id);
    }

    async fn reset(&self, ad_id: &str) {
        self.print("reset".yellow(), ad_id);
    }
}
