//! Fallback resolution across a provider chain.
//!
//! Providers are tried strictly one after another in chain order; the first
//! usable answer wins and later providers are never called. Adapter failures
//! are logged and swallowed here, so neither `search` nor `get` ever returns
//! a provider error:
//!
//! - `search` yields the first non-empty result list, or an empty list once
//!   the chain is exhausted
//! - `get` yields [`Resolution::Found`] or a typed [`Resolution::NotFound`]
//!   that records what each provider did

use std::sync::Arc;

use super::registry::ProviderRegistry;
use crate::model::{CanonicalRecord, EntityKind};
use crate::provider::{MetadataProvider, Operation, ProviderError, id};

/// Who a `get` id is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTarget {
    /// The id names a registered provider; only that provider is asked
    Scoped { provider: String, native_id: String },
    /// No registered provider prefix; every provider is asked with the whole id
    Agnostic(String),
}

impl LookupTarget {
    /// The native id `provider` should be asked for, if it should be asked.
    pub fn native_id_for(&self, provider: &str) -> Option<&str> {
        match self {
            LookupTarget::Scoped { provider: owner, native_id } if owner == provider => Some(native_id.as_str()),
            LookupTarget::Scoped { .. } => None,
            LookupTarget::Agnostic(native_id) => Some(native_id.as_str()),
        }
    }
}

/// Why a provider was not asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No handler for this kind
    Unsupported,
    /// The id belongs to another provider
    OtherProvenance,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Skipped(SkipReason),
    Failed(ProviderError),
}

/// What one provider in the chain did during a failed `get`
#[derive(Debug, Clone)]
pub struct Attempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

/// Result of a `get` resolution
#[derive(Debug, Clone)]
pub enum Resolution {
    Found { record: CanonicalRecord, provider: String },
    NotFound { attempts: Vec<Attempt> },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    /// Whether at least one provider was tried and every one that was tried
    /// failed to respond (network, timeout, HTTP status).
    pub fn all_unreachable(&self) -> bool {
        let Resolution::NotFound { attempts } = self else {
            return false;
        };
        let mut failures = attempts.iter().filter_map(|a| match &a.outcome {
            AttemptOutcome::Failed(e) => Some(e),
            AttemptOutcome::Skipped(_) => None,
        });
        let mut any = false;
        let all = failures.all(|e| {
            any = true;
            e.is_transport()
        });
        any && all
    }
}

/// Ordered fallback over the registry's chains
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<ProviderRegistry>,
}

impl Resolver {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Classify an incoming id.
    ///
    /// An id whose prefix is not a registered provider name is treated as a
    /// provider-agnostic native id (e.g. a bare MBID).
    pub fn target(&self, id: &str) -> LookupTarget {
        match id::decode(id) {
            Ok(composite) if self.registry.is_registered(composite.provider()) => LookupTarget::Scoped {
                provider: composite.provider().to_string(),
                native_id: composite.native_id().to_string(),
            },
            _ => LookupTarget::Agnostic(id.to_string()),
        }
    }

    /// Search each provider in turn until one returns something.
    pub async fn search(&self, kind: EntityKind, query: &str) -> Vec<CanonicalRecord> {
        for provider in self.registry.chain(kind) {
            if !provider.supports(kind, Operation::Search) {
                tracing::debug!(provider = provider.name(), %kind, "Provider cannot search this kind");
                continue;
            }

            match provider.search(kind, query).await {
                Ok(results) if !results.is_empty() => {
                    tracing::debug!(provider = provider.name(), %kind, count = results.len(), "Search resolved");
                    return results;
                }
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), %kind, "No search results, trying next provider");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), %kind, error = %e, "Search failed, trying next provider");
                }
            }
        }

        tracing::debug!(%kind, query, "Search exhausted every provider");
        Vec::new()
    }

    /// Fetch a record by composite (or provider-agnostic) id.
    pub async fn get(&self, kind: EntityKind, id: &str) -> Resolution {
        let target = self.target(id);
        let mut attempts = Vec::new();

        for provider in self.registry.chain(kind) {
            match self.try_get(provider.as_ref(), kind, &target).await {
                Ok(record) => {
                    tracing::debug!(provider = provider.name(), %kind, id, "Get resolved");
                    return Resolution::Found {
                        record,
                        provider: provider.name().to_string(),
                    };
                }
                Err(outcome) => attempts.push(Attempt {
                    provider: provider.name().to_string(),
                    outcome,
                }),
            }
        }

        tracing::debug!(%kind, id, attempts = attempts.len(), "Get exhausted every provider");
        Resolution::NotFound { attempts }
    }

    async fn try_get(
        &self,
        provider: &dyn MetadataProvider,
        kind: EntityKind,
        target: &LookupTarget,
    ) -> Result<CanonicalRecord, AttemptOutcome> {
        let Some(native_id) = target.native_id_for(provider.name()) else {
            return Err(AttemptOutcome::Skipped(SkipReason::OtherProvenance));
        };
        if !provider.supports(kind, Operation::Get) {
            tracing::debug!(provider = provider.name(), %kind, "Provider cannot get this kind");
            return Err(AttemptOutcome::Skipped(SkipReason::Unsupported));
        }

        match provider.get(kind, native_id).await {
            Ok(record) => Ok(record),
            Err(ProviderError::UnsupportedOperation { .. }) => {
                tracing::debug!(provider = provider.name(), %kind, "Provider cannot get this kind");
                Err(AttemptOutcome::Skipped(SkipReason::Unsupported))
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), %kind, native_id, error = %e, "Get failed, trying next provider");
                Err(AttemptOutcome::Failed(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Artist, ProviderIds};
    use crate::provider::ResponseValidator;
    use crate::provider::traits::mocks::{MockProvider, artist};
    use async_trait::async_trait;

    fn resolver(providers: Vec<Arc<MockProvider>>, kind: EntityKind) -> Resolver {
        let names: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();
        let dyn_providers: Vec<Arc<dyn MetadataProvider>> = providers
            .into_iter()
            .map(|p| p as Arc<dyn MetadataProvider>)
            .collect();
        let registry = ProviderRegistry::from_parts(dyn_providers, [(kind, names)]).unwrap();
        Resolver::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_search_stops_at_first_non_empty() {
        let a = Arc::new(MockProvider::new("a").with_search(EntityKind::Artist, vec![]));
        let b = Arc::new(MockProvider::new("b").with_search(EntityKind::Artist, vec![artist("b", "1", "Tortoise")]));
        let c = Arc::new(MockProvider::new("c").with_search(EntityKind::Artist, vec![artist("c", "9", "Tortoise")]));
        let resolver = resolver(vec![a.clone(), b.clone(), c.clone()], EntityKind::Artist);

        let results = resolver.search(EntityKind::Artist, "Tortoise").await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), "b-1");
        assert_eq!(a.search_count(), 1);
        assert_eq!(b.search_count(), 1);
        assert_eq!(c.search_count(), 0);
    }

    #[tokio::test]
    async fn test_search_error_advances_like_empty() {
        let a = Arc::new(
            MockProvider::new("a").with_search_error(EntityKind::Album, ProviderError::transport("HTTP 503")),
        );
        let b = Arc::new(MockProvider::new("b").with_search(EntityKind::Album, vec![]));
        let resolver = resolver(vec![a.clone(), b.clone()], EntityKind::Album);

        let results = resolver.search(EntityKind::Album, "Millions Now Living").await;

        assert!(results.is_empty());
        assert_eq!(a.search_count(), 1);
        assert_eq!(b.search_count(), 1);
    }

    #[tokio::test]
    async fn test_search_with_empty_chain_is_empty() {
        let resolver = resolver(vec![], EntityKind::Track);
        assert!(resolver.search(EntityKind::Track, "anything").await.is_empty());
    }

    #[tokio::test]
    async fn test_scoped_get_only_asks_owner() {
        let a = Arc::new(MockProvider::new("a").with_get(EntityKind::Artist, artist("a", "1", "Wrong")));
        let b = Arc::new(MockProvider::new("b").with_get(EntityKind::Artist, artist("b", "42", "Low")));
        let resolver = resolver(vec![a.clone(), b.clone()], EntityKind::Artist);

        let resolution = resolver.get(EntityKind::Artist, "b-42").await;

        let Resolution::Found { record, provider } = resolution else {
            panic!("expected a record");
        };
        assert_eq!(provider, "b");
        assert_eq!(record.id(), "b-42");
        assert_eq!(a.get_count(), 0);
        assert_eq!(*b.requested_ids.lock().unwrap(), vec!["42".to_string()]);
    }

    #[tokio::test]
    async fn test_scoped_get_keeps_separator_in_native_id() {
        let mb = Arc::new(MockProvider::new("musicbrainz").with_get(
            EntityKind::Track,
            CanonicalRecord::Track(crate::model::Track {
                id: "musicbrainz-5b11f4ce-a62d".to_string(),
                title: "Roygbiv".to_string(),
                explicit: None,
                provider_ids: ProviderIds::from([("musicbrainz".to_string(), "5b11f4ce-a62d".to_string())]),
            }),
        ));
        let resolver = resolver(vec![mb.clone()], EntityKind::Track);

        assert!(resolver.get(EntityKind::Track, "musicbrainz-5b11f4ce-a62d").await.is_found());
        assert_eq!(*mb.requested_ids.lock().unwrap(), vec!["5b11f4ce-a62d".to_string()]);
    }

    #[tokio::test]
    async fn test_agnostic_get_asks_everyone_in_order() {
        let a = Arc::new(MockProvider::new("a").with_get_error(EntityKind::Artist, ProviderError::transport("timeout")));
        let b = Arc::new(MockProvider::new("b").with_get(EntityKind::Artist, artist("b", "A-123", "Slint")));
        let resolver = resolver(vec![a.clone(), b.clone()], EntityKind::Artist);

        let target = resolver.target("A-123");
        assert_eq!(target, LookupTarget::Agnostic("A-123".to_string()));

        let resolution = resolver.get(EntityKind::Artist, "A-123").await;
        assert!(resolution.is_found());
        assert_eq!(*a.requested_ids.lock().unwrap(), vec!["A-123".to_string()]);
        assert_eq!(*b.requested_ids.lock().unwrap(), vec!["A-123".to_string()]);
    }

    #[tokio::test]
    async fn test_get_failures_are_swallowed_and_reported() {
        let a = Arc::new(MockProvider::new("a").with_get_error(EntityKind::Album, ProviderError::decode("bad json")));
        let b = Arc::new(MockProvider::new("b"));
        let c = Arc::new(
            MockProvider::new("c").with_get_error(EntityKind::Album, ProviderError::invalid("missing AlbumName")),
        );
        let resolver = resolver(vec![a, b.clone(), c], EntityKind::Album);

        let resolution = resolver.get(EntityKind::Album, "mbid-1").await;

        let Resolution::NotFound { attempts } = &resolution else {
            panic!("expected not found");
        };
        assert_eq!(attempts.len(), 3);
        assert!(matches!(attempts[0].outcome, AttemptOutcome::Failed(ProviderError::Decode(_))));
        assert!(matches!(attempts[1].outcome, AttemptOutcome::Skipped(SkipReason::Unsupported)));
        assert!(matches!(
            attempts[2].outcome,
            AttemptOutcome::Failed(ProviderError::InvalidUpstreamData(_))
        ));
        // Unsupported is decided structurally, without calling the provider
        assert_eq!(b.get_count(), 0);
        assert!(!resolution.all_unreachable());
    }

    #[tokio::test]
    async fn test_other_provenance_is_skipped() {
        let a = Arc::new(MockProvider::new("a").with_get(EntityKind::Artist, artist("a", "1", "x")));
        let b = Arc::new(MockProvider::new("b").with_get_error(EntityKind::Artist, ProviderError::transport("down")));
        let resolver = resolver(vec![a.clone(), b], EntityKind::Artist);

        let resolution = resolver.get(EntityKind::Artist, "b-7").await;

        let Resolution::NotFound { attempts } = &resolution else {
            panic!("expected not found");
        };
        assert!(matches!(attempts[0].outcome, AttemptOutcome::Skipped(SkipReason::OtherProvenance)));
        assert_eq!(a.get_count(), 0);
        assert!(resolution.all_unreachable());
    }

    #[test]
    fn test_all_unreachable_needs_an_attempt() {
        let skipped_only = Resolution::NotFound {
            attempts: vec![Attempt {
                provider: "a".to_string(),
                outcome: AttemptOutcome::Skipped(SkipReason::Unsupported),
            }],
        };
        assert!(!skipped_only.all_unreachable());
    }

    /// Returns a record that fails the closed `get` schema, through the real validator.
    struct DriftingProvider {
        validator: ResponseValidator,
    }

    #[async_trait]
    impl MetadataProvider for DriftingProvider {
        fn name(&self) -> &str {
            "drift"
        }

        fn supports(&self, _kind: EntityKind, _operation: Operation) -> bool {
            true
        }

        async fn search(&self, _kind: EntityKind, _query: &str) -> Result<Vec<CanonicalRecord>, ProviderError> {
            Ok(Vec::new())
        }

        async fn get(&self, _kind: EntityKind, native_id: &str) -> Result<CanonicalRecord, ProviderError> {
            // No provider ids: rejected by the schema
            let record = CanonicalRecord::Artist(Artist {
                id: format!("drift-{native_id}"),
                artist_name: "Unwound".to_string(),
                overview: None,
                images: None,
                albums: None,
                provider_ids: ProviderIds::new(),
            });
            self.validator.check_record(record)
        }
    }

    #[tokio::test]
    async fn test_validation_rejection_advances_chain() {
        let drift: Arc<dyn MetadataProvider> = Arc::new(DriftingProvider {
            validator: ResponseValidator::new(),
        });
        let good = Arc::new(MockProvider::new("good").with_get(EntityKind::Artist, artist("good", "u1", "Unwound")));
        let registry = ProviderRegistry::from_parts(
            vec![drift, good.clone() as Arc<dyn MetadataProvider>],
            [(EntityKind::Artist, vec!["drift".to_string(), "good".to_string()])],
        )
        .unwrap();
        let resolver = Resolver::new(Arc::new(registry));

        let resolution = resolver.get(EntityKind::Artist, "u1").await;

        let Resolution::Found { provider, .. } = resolution else {
            panic!("expected the second provider to answer");
        };
        assert_eq!(provider, "good");
        assert_eq!(good.get_count(), 1);
    }
}
