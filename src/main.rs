//! Music Meta Cache - a caching aggregator for music metadata providers.
//!
//! Artist, album and track records are fetched from a configurable chain of
//! providers (Discogs, Last.fm, MusicBrainz), normalized into one canonical
//! shape, validated, and cached in SQLite until they go stale.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod provider;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("music_meta_cache=info".parse()?))
        .init();

    cli::run_command(&args)
}
