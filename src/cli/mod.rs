//! CLI module for lazyslot - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running the feed simulation and
//! inspecting zones and feed layout.

pub mod commands;
pub mod console;

pub use commands::Cli;
