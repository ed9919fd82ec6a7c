//! CLI command definitions and dispatch.
//!
//! This module provides the command-line interface for the metadata cache.
//! Subcommands live in submodules:
//! - `catalog`: searching and fetching records through the store
//! - `settings`: showing chains and the effective configuration

mod catalog;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

use crate::catalog::{ProviderRegistry, RecordStore, Resolver};
use crate::config::{self, Config, ProviderVariant};
use crate::db::{self, SqliteRepository};
use crate::model::EntityKind;

pub use catalog::{cmd_get, cmd_search};
pub use settings::{cmd_config, cmd_providers};

/// Music metadata cache CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache database file (overrides the config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Discogs personal access token
    #[arg(long, env = "DISCOGS_TOKEN", global = true, hide_env_values = true)]
    pub discogs_token: Option<String>,

    /// Last.fm API key
    #[arg(long, env = "LASTFM_API_KEY", global = true, hide_env_values = true)]
    pub lastfm_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Search providers for records matching a query
    Search {
        /// Entity kind: artist, album or track
        kind: EntityKind,
        /// Free-text query
        query: String,
    },
    /// Fetch records by id, serving them from cache while fresh
    Get {
        /// Entity kind: artist, album or track
        kind: EntityKind,
        /// Composite ids such as `discogs-45`, or bare provider ids; several
        /// may be given, space- or comma-separated
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<String>,
    },
    /// Show the registered providers and fallback chains
    Providers,
    /// Print the effective configuration
    Config {
        /// Also save it to the config file
        #[arg(long)]
        write: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Search { kind, query } => {
            let config = load_config(cli)?;
            cmd_search(&rt, &config, *kind, query)
        }
        Commands::Get { kind, ids } => {
            let config = load_config(cli)?;
            cmd_get(&rt, &config, *kind, ids)
        }
        Commands::Providers => {
            let config = load_config(cli)?;
            cmd_providers(&config)
        }
        Commands::Config { write } => {
            // Credentials from flags or the environment are never written back
            let config = read_config_file(cli.config.as_deref())?;
            cmd_config(&config, cli.config.as_deref(), *write)
        }
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Read the config file without command-line overrides.
///
/// An explicit `--config` path must parse; the default location falls back
/// to defaults.
fn read_config_file(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(config::load_from(path)?),
        None => Ok(config::load()),
    }
}

/// The config file with credentials from flags and the environment applied.
pub(crate) fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = read_config_file(cli.config.as_deref())?;
    if let Some(token) = &cli.discogs_token {
        config.apply_token(ProviderVariant::Discogs, token);
    }
    if let Some(key) = &cli.lastfm_api_key {
        config.apply_token(ProviderVariant::Lastfm, key);
    }
    if let Some(db) = &cli.db {
        config.cache.database = Some(db.clone());
    }
    Ok(config)
}

/// Build the registry and open the cache database.
pub(crate) async fn open_store(config: &Config) -> anyhow::Result<RecordStore> {
    let registry = ProviderRegistry::from_config(config).context("Invalid provider configuration")?;

    let db_path = config
        .cache
        .database_path()
        .context("Could not determine a database location; pass --db")?;
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let pool = db::init_db(&db::db_url(Some(&db_path)))
        .await
        .with_context(|| format!("Failed to open cache database {}", db_path.display()))?;
    tracing::debug!(db = %db_path.display(), "Cache database ready");

    Ok(RecordStore::new(
        Arc::new(SqliteRepository::new(pool)),
        Resolver::new(Arc::new(registry)),
        config.cache.expiration(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_get() {
        let cli = Cli::try_parse_from(["music-meta-cache", "get", "album", "discogs-249504"]).unwrap();
        match cli.command {
            Commands::Get { kind, ids } => {
                assert_eq!(kind, EntityKind::Album);
                assert_eq!(ids, vec!["discogs-249504".to_string()]);
            }
            _ => panic!("expected get"),
        }
    }

    #[test]
    fn test_parse_get_many() {
        let cli = Cli::try_parse_from(["music-meta-cache", "get", "track", "lastfm-a,lastfm-b", "musicbrainz-c"]).unwrap();
        let Commands::Get { ids, .. } = cli.command else {
            panic!("expected get");
        };
        assert_eq!(ids, vec!["lastfm-a", "lastfm-b", "musicbrainz-c"]);
    }

    #[test]
    fn test_parse_get_requires_an_id() {
        assert!(Cli::try_parse_from(["music-meta-cache", "get", "track"]).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["music-meta-cache", "search", "playlist", "x"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "music-meta-cache",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--db",
            "/tmp/override.db",
            "--lastfm-api-key",
            "secret",
            "providers",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.cache.database, Some(PathBuf::from("/tmp/override.db")));
        assert_eq!(config.provider("lastfm").unwrap().token.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_open_store_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.cache.database = Some(dir.path().join("nested").join("cache.db"));

        let store = open_store(&config).await.unwrap();
        assert_eq!(store.expiration(), config.cache.expiration());
        assert!(dir.path().join("nested").join("cache.db").exists());
    }
}
