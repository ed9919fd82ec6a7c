//! The adapter contract every provider implements.
//!
//! The resolver only ever talks to `dyn MetadataProvider`, so tests can
//! substitute the mocks in [`mocks`] for real HTTP-backed adapters.
//!
//! # Example
//!
//! ```ignore
//! use music_meta_cache::provider::traits::MetadataProvider;
//!
//! async fn first_hit(provider: &dyn MetadataProvider) -> Option<CanonicalRecord> {
//!     provider.search(EntityKind::Artist, "Björk").await.ok()?.into_iter().next()
//! }
//! ```

use async_trait::async_trait;

use super::domain::{Operation, ProviderError};
use crate::model::{CanonicalRecord, EntityKind};

/// A metadata provider adapter.
///
/// Results are already mapped into canonical records whose ids are composite
/// ids carrying this provider's name.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name, embedded in every composite id it produces.
    fn name(&self) -> &str;

    /// Whether a handler exists for `kind` and `operation`.
    fn supports(&self, kind: EntityKind, operation: Operation) -> bool;

    /// Search for records matching `query`.
    ///
    /// An unsupported kind yields an empty list, so "can't help" looks the
    /// same as "found nothing".
    async fn search(&self, kind: EntityKind, query: &str) -> Result<Vec<CanonicalRecord>, ProviderError>;

    /// Fetch one record by its provider-native id.
    ///
    /// An unsupported kind fails with [`ProviderError::UnsupportedOperation`].
    async fn get(&self, kind: EntityKind, native_id: &str) -> Result<CanonicalRecord, ProviderError>;
}
