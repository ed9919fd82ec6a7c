//! Metadata provider layer
//!
//! Everything needed to talk to one upstream metadata source:
//!
//! - `domain` - operation names and [`ProviderError`]
//! - `id` - composite id encoding (`<provider>-<native id>`)
//! - `request` - the HTTP executor, request specs and body decoding
//! - `xml` - XML bodies folded into JSON trees
//! - `validate` - JSON Schema checks on every adapter result
//! - `traits` - the [`MetadataProvider`] contract
//!
//! Concrete adapters live in `discogs`, `lastfm` and `musicbrainz`. Each keeps
//! the same split: `dto.rs` mirrors the upstream response, `adapter.rs` maps
//! it into canonical records, `client.rs` issues the requests.

pub mod discogs;
pub mod domain;
pub mod id;
pub mod lastfm;
pub mod musicbrainz;
pub mod request;
pub mod traits;
pub mod validate;
pub mod xml;

pub use domain::{Operation, ProviderError};
pub use id::{CompositeId, IdError, SEPARATOR};
pub use request::{Body, ContentMode, ExecutorConfig, HttpExecutor, RequestSpec};
pub use traits::MetadataProvider;
pub use validate::ResponseValidator;

use crate::model::ProviderIds;

/// Composite id for a record an adapter is building.
pub(crate) fn record_id(provider: &str, native_id: &str) -> Result<String, ProviderError> {
    if native_id.is_empty() {
        return Err(ProviderError::invalid(format!("{provider} returned a record without an id")));
    }
    id::encode(provider, native_id).map_err(|e| ProviderError::invalid(e.to_string()))
}

/// A provider id map with a single entry.
pub(crate) fn provider_ids(provider: &str, native_id: &str) -> ProviderIds {
    ProviderIds::from([(provider.to_string(), native_id.to_string())])
}

/// `None` for blank strings, trimmed text otherwise.
pub(crate) fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Year from a date string (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
pub(crate) fn parse_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.trim().parse().ok())
        .filter(|y| *y > 0)
}
