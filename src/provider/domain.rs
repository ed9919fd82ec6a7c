//! Provider-level errors and operation names.
//!
//! Every adapter reports failures through [`ProviderError`]. The fallback
//! resolver treats all of them as "try the next provider"; none of them is
//! ever surfaced to callers of the store.

use std::fmt;

use crate::model::EntityKind;

/// The two operations an adapter can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Get,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Get => "get",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to a provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Network failure, timeout or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body could not be parsed in the adapter's content mode
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The body parsed but does not have the expected shape
    #[error("Invalid upstream data: {0}")]
    InvalidUpstreamData(String),

    #[error("{provider} cannot {operation} {kind} records")]
    UnsupportedOperation {
        provider: String,
        kind: EntityKind,
        operation: Operation,
    },
}

impl ProviderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidUpstreamData(message.into())
    }

    pub fn unsupported(provider: impl Into<String>, kind: EntityKind, operation: Operation) -> Self {
        Self::UnsupportedOperation {
            provider: provider.into(),
            kind,
            operation,
        }
    }

    /// Whether the failure happened before any data came back.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Transport(format!("request timed out: {err}"))
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message_names_provider_and_kind() {
        let err = ProviderError::unsupported("discogs", EntityKind::Track, Operation::Get);
        assert_eq!(err.to_string(), "discogs cannot get track records");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_classification() {
        assert!(ProviderError::transport("HTTP 503").is_transport());
        assert!(!ProviderError::decode("bad json").is_transport());
        assert!(!ProviderError::invalid("missing title").is_transport());
    }
}
