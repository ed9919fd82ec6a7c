//! Composite identifiers.
//!
//! A composite id is `<provider><SEPARATOR><native id>`, e.g. `discogs-1234`
//! or `musicbrainz-5b11f4ce-a62d-471e-81fc-a69a8278c7da`. Provider names never
//! contain the separator; native ids may. Decoding therefore splits on the
//! FIRST separator only, which keeps `decode(encode(p, n)) == (p, n)` for every
//! native id.

use std::fmt;
use std::str::FromStr;

/// Separator between the provider name and the native id.
pub const SEPARATOR: char = '-';

/// A decoded composite id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    provider: String,
    native_id: String,
}

/// Errors from encoding or decoding composite ids
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("provider name must not be empty")]
    EmptyProvider,

    #[error("provider name {0:?} contains the id separator '-'")]
    SeparatorInProvider(String),

    #[error("id {0:?} has no provider prefix")]
    MissingSeparator(String),

    #[error("id {0:?} has an empty native id")]
    EmptyNativeId(String),
}

/// Check that a provider name can be embedded in a composite id.
pub fn validate_provider_name(provider: &str) -> Result<(), IdError> {
    if provider.is_empty() {
        return Err(IdError::EmptyProvider);
    }
    if provider.contains(SEPARATOR) {
        return Err(IdError::SeparatorInProvider(provider.to_string()));
    }
    Ok(())
}

/// Build the composite id string for a provider-native id.
pub fn encode(provider: &str, native_id: &str) -> Result<String, IdError> {
    validate_provider_name(provider)?;
    Ok(format!("{provider}{SEPARATOR}{native_id}"))
}

/// Split a composite id into its provider name and native id.
pub fn decode(composite: &str) -> Result<CompositeId, IdError> {
    let (provider, native_id) = composite
        .split_once(SEPARATOR)
        .ok_or_else(|| IdError::MissingSeparator(composite.to_string()))?;

    if provider.is_empty() {
        return Err(IdError::EmptyProvider);
    }
    if native_id.is_empty() {
        return Err(IdError::EmptyNativeId(composite.to_string()));
    }

    Ok(CompositeId {
        provider: provider.to_string(),
        native_id: native_id.to_string(),
    })
}

impl CompositeId {
    pub fn new(provider: impl Into<String>, native_id: impl Into<String>) -> Result<Self, IdError> {
        let provider = provider.into();
        validate_provider_name(&provider)?;
        Ok(Self {
            provider,
            native_id: native_id.into(),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn native_id(&self) -> &str {
        &self.native_id
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.provider, SEPARATOR, self.native_id)
    }
}

impl FromStr for CompositeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_simple() {
        assert_eq!(encode("discogs", "1234").unwrap(), "discogs-1234");
    }

    #[test]
    fn test_decode_splits_on_first_separator_only() {
        let id = decode("musicbrainz-5b11f4ce-a62d-471e-81fc-a69a8278c7da").unwrap();
        assert_eq!(id.provider(), "musicbrainz");
        assert_eq!(id.native_id(), "5b11f4ce-a62d-471e-81fc-a69a8278c7da");
    }

    #[test]
    fn test_encode_rejects_separator_in_provider() {
        assert_eq!(
            encode("last-fm", "x"),
            Err(IdError::SeparatorInProvider("last-fm".to_string()))
        );
        assert_eq!(encode("", "x"), Err(IdError::EmptyProvider));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("1234"), Err(IdError::MissingSeparator(_))));
        assert!(matches!(decode("-1234"), Err(IdError::EmptyProvider)));
        assert!(matches!(decode("discogs-"), Err(IdError::EmptyNativeId(_))));
    }

    #[test]
    fn test_display_matches_encode() {
        let id = CompositeId::new("lastfm", "a-b").unwrap();
        assert_eq!(id.to_string(), encode("lastfm", "a-b").unwrap());
        assert_eq!("lastfm-a-b".parse::<CompositeId>().unwrap(), id);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(provider in "[a-z0-9_.]{1,16}", native in ".{1,40}") {
            let composite = encode(&provider, &native).unwrap();
            let decoded = decode(&composite).unwrap();
            prop_assert_eq!(decoded.provider(), provider.as_str());
            prop_assert_eq!(decoded.native_id(), native.as_str());
            prop_assert_eq!(decoded.to_string(), composite);
        }
    }
}
