//! Immutable provider registry.
//!
//! Built once at startup from [`Config`] and shared by reference with the
//! resolver and the store. Holds every enabled adapter plus one ordered
//! fallback chain per entity kind; a provider may sit in several chains.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::{Config, ProviderSettings, ProviderVariant};
use crate::error::{Error, Result, ResultExt};
use crate::model::EntityKind;
use crate::provider::discogs::DiscogsClient;
use crate::provider::lastfm::LastFmClient;
use crate::provider::musicbrainz::MusicBrainzClient;
use crate::provider::{MetadataProvider, ResponseValidator, id};

/// Registered adapters and their per-kind fallback order
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn MetadataProvider>>,
    chains: HashMap<EntityKind, Vec<Arc<dyn MetadataProvider>>>,
}

impl ProviderRegistry {
    /// Build adapters for every enabled provider and wire up the chains.
    pub fn from_config(config: &Config) -> Result<Self> {
        let validator = Arc::new(ResponseValidator::new());

        let mut providers = Vec::new();
        for settings in config.providers.iter().filter(|p| p.enabled) {
            let provider = build_provider(settings, Arc::clone(&validator))
                .with_context(format!("provider {:?}", settings.name))?;
            providers.push(provider);
        }

        let chains = EntityKind::ALL.map(|kind| (kind, config.chains.for_kind(kind).to_vec()));
        Self::from_parts(providers, chains)
    }

    /// Assemble a registry from ready-made adapters.
    ///
    /// Provider names must be valid composite-id prefixes and unique; chains
    /// may only reference registered providers, each at most once.
    pub fn from_parts(
        providers: Vec<Arc<dyn MetadataProvider>>,
        chains: impl IntoIterator<Item = (EntityKind, Vec<String>)>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for provider in &providers {
            id::validate_provider_name(provider.name()).map_err(|e| Error::config(e.to_string()))?;
            if !seen.insert(provider.name().to_string()) {
                return Err(Error::config(format!("duplicate provider name {:?}", provider.name())));
            }
        }

        let mut resolved = HashMap::new();
        for (kind, names) in chains {
            let mut chain: Vec<Arc<dyn MetadataProvider>> = Vec::with_capacity(names.len());
            for name in &names {
                let provider = providers.iter().find(|p| p.name() == name.as_str()).ok_or_else(|| {
                    Error::config(format!("{kind} chain references unknown or disabled provider {name:?}"))
                })?;
                if chain.iter().any(|p| p.name() == name.as_str()) {
                    return Err(Error::config(format!("{kind} chain lists {name:?} twice")));
                }
                chain.push(Arc::clone(provider));
            }
            resolved.insert(kind, chain);
        }

        for kind in EntityKind::ALL {
            let names: Vec<&str> = resolved
                .get(&kind)
                .map(|c| c.iter().map(|p| p.name()).collect())
                .unwrap_or_default();
            tracing::debug!(%kind, chain = ?names, "Fallback chain");
        }

        Ok(Self {
            providers,
            chains: resolved,
        })
    }

    /// The fallback chain for `kind`, in priority order.
    pub fn chain(&self, kind: EntityKind) -> &[Arc<dyn MetadataProvider>] {
        self.chains.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<dyn MetadataProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.provider(name).is_some()
    }

    /// Registered provider names, in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }
}

/// Instantiate the adapter variant named by `settings`.
fn build_provider(settings: &ProviderSettings, validator: Arc<ResponseValidator>) -> Result<Arc<dyn MetadataProvider>> {
    id::validate_provider_name(&settings.name).map_err(|e| Error::config(e.to_string()))?;
    if !settings.variant.supports_content(settings.content) {
        return Err(Error::config(format!(
            "{} adapters cannot decode {:?} content",
            settings.variant, settings.content
        )));
    }

    let executor = settings.executor_config();
    let token = settings.token.as_deref();
    let provider: Arc<dyn MetadataProvider> = match settings.variant {
        ProviderVariant::Discogs => Arc::new(DiscogsClient::new(&settings.name, executor, token, validator)?),
        ProviderVariant::Lastfm => Arc::new(LastFmClient::new(&settings.name, executor, token, validator)?),
        ProviderVariant::Musicbrainz => Arc::new(MusicBrainzClient::new(&settings.name, executor, validator)?),
    };

    tracing::debug!(
        name = %settings.name,
        variant = %settings.variant,
        authenticated = token.is_some(),
        "Registered provider"
    );
    Ok(provider)
}
