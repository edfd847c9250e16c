//! CLI command definitions using clap.
//!
//! - simulate: scroll the synthetic feed and print every state change
//! - zones: show the zone ranges around a viewport
//! - feed: show the synthetic feed layout

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lazyslot - viewport-driven lazy loading for ad slots
#[derive(Parser, Debug)]
#[command(name = "lazyslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    pub log_stderr: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scroll the synthetic feed down and back up, printing state changes
    Simulate {
        /// Override the configured scroll speed (distance per second)
        #[arg(short, long)]
        scroll_speed: Option<f64>,

        /// Print changes as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show fetch/display/unload zone ranges around a viewport
    Zones {
        /// Top edge of the viewport
        #[arg(short = 'y', long, default_value_t = 0.0)]
        viewport_y: f64,

        /// Viewport height (defaults to the configured simulation viewport)
        #[arg(long)]
        viewport_height: Option<f64>,
    },

    /// Show the synthetic feed layout
    Feed,
}
