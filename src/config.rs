//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\music-meta-cache\config.toml
//! - macOS: ~/Library/Application Support/music-meta-cache/config.toml
//! - Linux: ~/.config/music-meta-cache/config.toml
//!
//! A missing file means the built-in defaults: the three bundled providers
//! (Discogs, Last.fm, MusicBrainz) chained in that order for every kind, and
//! a seven day expiration window.
//!
//! ```toml
//! [cache]
//! expiration_secs = 604800
//!
//! [[providers]]
//! name = "discogs"
//! variant = "discogs"
//! token = "..."
//!
//! [[providers]]
//! name = "musicbrainz"
//! variant = "musicbrainz"
//! min_interval_ms = 1000
//!
//! [chains]
//! artist = ["discogs", "musicbrainz"]
//! album = ["discogs", "musicbrainz"]
//! track = ["musicbrainz"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::EntityKind;
use crate::provider::request::{ContentMode, ExecutorConfig};
use crate::provider::{discogs, lastfm, musicbrainz};

/// Default expiration window: one week
pub const DEFAULT_EXPIRATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache behaviour
    pub cache: CacheConfig,

    /// Provider definitions
    pub providers: Vec<ProviderSettings>,

    /// Fallback order per entity kind
    pub chains: ChainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            providers: vec![
                ProviderSettings::new("discogs", ProviderVariant::Discogs),
                ProviderSettings::new("lastfm", ProviderVariant::Lastfm),
                ProviderSettings::new("musicbrainz", ProviderVariant::Musicbrainz),
            ],
            chains: ChainConfig::default(),
        }
    }
}

impl Config {
    /// Set the token of every provider of `variant`.
    ///
    /// Used for credentials passed on the command line or through the
    /// environment, which win over the file.
    pub fn apply_token(&mut self, variant: ProviderVariant, token: &str) {
        for provider in self.providers.iter_mut().filter(|p| p.variant == variant) {
            provider.token = Some(token.to_string());
        }
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.name == name)
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Records older than this are refreshed before being served
    pub expiration_secs: u64,

    /// SQLite database file (default: OS data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            database: None,
        }
    }
}

impl CacheConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }

    /// Configured database path, or the default one under the data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("music-meta-cache").join("cache.db")))
    }
}

/// The closed set of adapter implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderVariant {
    Discogs,
    Lastfm,
    Musicbrainz,
}

impl ProviderVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderVariant::Discogs => "discogs",
            ProviderVariant::Lastfm => "lastfm",
            ProviderVariant::Musicbrainz => "musicbrainz",
        }
    }

    pub fn default_base_uri(&self) -> &'static str {
        match self {
            ProviderVariant::Discogs => discogs::DEFAULT_BASE_URI,
            ProviderVariant::Lastfm => lastfm::DEFAULT_BASE_URI,
            ProviderVariant::Musicbrainz => musicbrainz::DEFAULT_BASE_URI,
        }
    }

    pub fn default_min_interval(&self) -> Duration {
        match self {
            ProviderVariant::Musicbrainz => musicbrainz::DEFAULT_MIN_INTERVAL,
            ProviderVariant::Discogs | ProviderVariant::Lastfm => Duration::ZERO,
        }
    }

    /// Content modes the variant's DTOs can be read from.
    pub fn supports_content(&self, mode: ContentMode) -> bool {
        match self {
            ProviderVariant::Musicbrainz => matches!(mode, ContentMode::Json | ContentMode::Xml),
            ProviderVariant::Discogs | ProviderVariant::Lastfm => mode == ContentMode::Json,
        }
    }
}

impl std::fmt::Display for ProviderVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Name embedded in composite ids; must not contain the id separator
    pub name: String,

    pub variant: ProviderVariant,

    /// API root (default: the variant's public endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,

    #[serde(default)]
    pub content: ContentMode,

    /// API token or key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum gap between requests (default: the variant's rate limit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_interval_ms: Option<u64>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Extra default headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Extra default query parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_enabled() -> bool {
    true
}

impl ProviderSettings {
    pub fn new(name: impl Into<String>, variant: ProviderVariant) -> Self {
        Self {
            name: name.into(),
            variant,
            base_uri: None,
            content: ContentMode::Json,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_interval_ms: None,
            enabled: true,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
        }
    }

    /// Executor settings with variant defaults filled in.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            base_uri: self
                .base_uri
                .clone()
                .unwrap_or_else(|| self.variant.default_base_uri().to_string()),
            content: self.content,
            headers: self.headers.clone(),
            query: self.query.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            min_interval: self
                .min_interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| self.variant.default_min_interval()),
        }
    }
}

/// Ordered provider names per entity kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub artist: Vec<String>,
    pub album: Vec<String>,
    pub track: Vec<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        let all = vec!["discogs".to_string(), "lastfm".to_string(), "musicbrainz".to_string()];
        Self {
            artist: all.clone(),
            album: all.clone(),
            track: all,
        }
    }
}

impl ChainConfig {
    pub fn for_kind(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::Artist => &self.artist,
            EntityKind::Album => &self.album,
            EntityKind::Track => &self.track,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-meta-cache"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path
///
/// A missing file yields defaults; an unreadable or invalid file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config = toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

/// Save configuration to `path`
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path).map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0:?}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0:?}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to create config directory {0:?}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0:?}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0:?} to {1:?}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        crate::error::Error::Config(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[[providers]]"));
        assert!(toml.contains("[chains]"));
        assert!(toml.contains("variant = \"musicbrainz\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.cache.expiration_secs = 60;
        config.apply_token(ProviderVariant::Discogs, "tok-123");
        config.chains.track = vec!["musicbrainz".to_string()];

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.cache.expiration_secs, 60);
        assert_eq!(parsed.provider("discogs").unwrap().token.as_deref(), Some("tok-123"));
        assert_eq!(parsed.provider("lastfm").unwrap().token, None);
        assert_eq!(parsed.chains.track, vec!["musicbrainz".to_string()]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[cache]
expiration_secs = 3600

[[providers]]
name = "mb"
variant = "musicbrainz"

[chains]
artist = ["mb"]
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.cache.expiration(), Duration::from_secs(3600));
        assert_eq!(config.providers.len(), 1);

        let mb = &config.providers[0];
        assert!(mb.enabled);
        assert_eq!(mb.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(mb.content, ContentMode::Json);

        // Unspecified chains keep their defaults
        assert_eq!(config.chains.for_kind(EntityKind::Artist), ["mb".to_string()]);
        assert_eq!(config.chains.album.len(), 3);
    }

    #[test]
    fn test_executor_config_fills_variant_defaults() {
        let settings = ProviderSettings::new("mb", ProviderVariant::Musicbrainz);
        let executor = settings.executor_config();
        assert_eq!(executor.base_uri, musicbrainz::DEFAULT_BASE_URI);
        assert_eq!(executor.min_interval, Duration::from_millis(1000));
        assert_eq!(executor.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let mut custom = ProviderSettings::new("mb", ProviderVariant::Musicbrainz);
        custom.base_uri = Some("http://localhost:5000/ws/2/".to_string());
        custom.min_interval_ms = Some(0);
        let executor = custom.executor_config();
        assert_eq!(executor.base_uri, "http://localhost:5000/ws/2/");
        assert!(executor.min_interval.is_zero());
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.cache.expiration_secs, DEFAULT_EXPIRATION_SECS);
    }

    #[test]
    fn test_load_from_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[providers]]\nname = 3\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(..))));
    }

    #[test]
    fn test_save_to_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.cache.database = Some(PathBuf::from("/tmp/cache.db"));
        save_to(&config, &path).unwrap();

        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.cache.database, Some(PathBuf::from("/tmp/cache.db")));
    }
}
