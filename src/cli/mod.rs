//! Command-line interface for music-meta-cache.
//!
//! This module provides CLI commands for searching providers, fetching
//! cached records and inspecting the provider configuration.

mod commands;

pub use commands::{Cli, Commands, run_command};
