//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - [`ProviderError`] stays inside the provider layer; the resolver swallows
//!   it, so callers of the store only ever see [`Error::NotFound`] for an
//!   unresolvable record
//! - All errors implement `std::error::Error` for compatibility
//!
//! # Example
//!
//! ```ignore
//! use music_meta_cache::error::{Error, Result};
//!
//! async fn show(store: &RecordStore, id: &str) -> Result<()> {
//!     match store.get(EntityKind::Artist, id).await {
//!         Ok(record) => println!("{}", serde_json::to_string(&record)?),
//!         Err(Error::NotFound { .. }) => println!("no such artist"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

use crate::model::EntityKind;
use crate::provider::ProviderError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Provider failure that escaped the resolver (registry construction)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Every provider was exhausted and nothing is cached
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// Stored payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller input that can't be served, e.g. an id list with no usable ids
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this is (or wraps) a [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found(EntityKind::Album, "discogs-367084");
        assert_eq!(err.to_string(), "album discogs-367084 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::config("duplicate provider").context("while building registry");
        let msg = err.to_string();
        assert!(msg.contains("while building registry"));
        assert!(msg.contains("duplicate provider"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_context_keeps_not_found() {
        let err = Error::not_found(EntityKind::Track, "x").context("cli get");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(Error::config("test"));
        let with_ctx = result.with_context("additional context");
        assert!(with_ctx.unwrap_err().to_string().contains("additional context"));
    }

    #[test]
    fn test_provider_error_converts() {
        let err: Error = ProviderError::transport("HTTP 503").into();
        assert!(matches!(err, Error::Provider(_)));
    }
}
