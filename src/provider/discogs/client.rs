//! Discogs HTTP client
//!
//! See: https://www.discogs.com/developers
//!
//! Discogs asks for a descriptive User-Agent and a personal access token for
//! database search. Unauthenticated clients are limited to 25 req/min.

use std::sync::Arc;

use async_trait::async_trait;

use super::{adapter, dto};
use crate::model::{CanonicalRecord, EntityKind};
use crate::provider::request::{ContentMode, ExecutorConfig, HttpExecutor, RequestSpec};
use crate::provider::{MetadataProvider, Operation, ProviderError, ResponseValidator};

/// Default API root
pub const DEFAULT_BASE_URI: &str = "https://api.discogs.com/";

/// Discogs API client
pub struct DiscogsClient {
    name: String,
    executor: HttpExecutor,
    validator: Arc<ResponseValidator>,
}

impl DiscogsClient {
    /// Create a client registered under `name`.
    ///
    /// `token` becomes the `Authorization: Discogs token=...` header. Paging
    /// defaults are added unless the configuration already sets them.
    pub fn new(
        name: &str,
        mut config: ExecutorConfig,
        token: Option<&str>,
        validator: Arc<ResponseValidator>,
    ) -> Result<Self, ProviderError> {
        if config.content != ContentMode::Json {
            return Err(ProviderError::decode(format!(
                "Discogs responses are only read as JSON, not {:?}",
                config.content
            )));
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            config
                .headers
                .insert("Authorization".to_string(), format!("Discogs token={token}"));
        }
        config.query.entry("page".to_string()).or_insert_with(|| "1".to_string());
        config
            .query
            .entry("per_page".to_string())
            .or_insert_with(|| "50".to_string());

        Ok(Self {
            name: name.to_string(),
            executor: HttpExecutor::new(&config)?,
            validator,
        })
    }

    async fn database_search(&self, query: &str, kind: &str) -> Result<dto::SearchResponse, ProviderError> {
        self.executor
            .execute(RequestSpec::query("database/search", [("q", query), ("type", kind)]))
            .await?
            .parse()
    }

    async fn search_artists(&self, query: &str) -> Result<Vec<CanonicalRecord>, ProviderError> {
        let response = self.database_search(query, "artist").await?;
        adapter::search_artists(&self.name, response)
    }

    async fn search_albums(&self, query: &str) -> Result<Vec<CanonicalRecord>, ProviderError> {
        let response = self.database_search(query, "master").await?;
        adapter::search_albums(&self.name, response)
    }

    async fn get_artist(&self, native_id: &str) -> Result<CanonicalRecord, ProviderError> {
        let response: dto::ArtistResponse = self
            .executor
            .execute(RequestSpec::path(format!("artists/{}", urlencoding::encode(native_id))))
            .await?
            .parse()?;
        Ok(adapter::to_artist(&self.name, response)?.into())
    }

    async fn get_album(&self, native_id: &str) -> Result<CanonicalRecord, ProviderError> {
        let response: dto::ReleaseResponse = self
            .executor
            .execute(RequestSpec::path(format!("releases/{}", urlencoding::encode(native_id))))
            .await?
            .parse()?;
        Ok(adapter::to_album(&self.name, response)?.into())
    }
}

#[async_trait]
impl MetadataProvider for DiscogsClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, kind: EntityKind, _operation: Operation) -> bool {
        matches!(kind, EntityKind::Artist | EntityKind::Album)
    }

    async fn search(&self, kind: EntityKind, query: &str) -> Result<Vec<CanonicalRecord>, ProviderError> {
        let records = match kind {
            EntityKind::Artist => self.search_artists(query).await?,
            EntityKind::Album => self.search_albums(query).await?,
            EntityKind::Track => return Ok(Vec::new()),
        };
        self.validator.check_results(kind, records)
    }

    async fn get(&self, kind: EntityKind, native_id: &str) -> Result<CanonicalRecord, ProviderError> {
        let record = match kind {
            EntityKind::Artist => self.get_artist(native_id).await?,
            EntityKind::Album => self.get_album(native_id).await?,
            EntityKind::Track => return Err(ProviderError::unsupported(&self.name, kind, Operation::Get)),
        };
        self.validator.check_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DiscogsClient {
        let config = ExecutorConfig {
            base_uri: DEFAULT_BASE_URI.to_string(),
            ..Default::default()
        };
        DiscogsClient::new("discogs", config, Some("secret"), Arc::new(ResponseValidator::new())).unwrap()
    }

    #[test]
    fn test_supported_kinds() {
        let client = client();
        assert_eq!(client.name(), "discogs");
        assert!(client.supports(EntityKind::Artist, Operation::Get));
        assert!(client.supports(EntityKind::Album, Operation::Search));
        assert!(!client.supports(EntityKind::Track, Operation::Get));
        assert!(!client.supports(EntityKind::Track, Operation::Search));
    }

    #[test]
    fn test_rejects_xml_content() {
        let config = ExecutorConfig {
            base_uri: DEFAULT_BASE_URI.to_string(),
            content: ContentMode::Xml,
            ..Default::default()
        };
        let result = DiscogsClient::new("discogs", config, None, Arc::new(ResponseValidator::new()));
        assert!(matches!(result, Err(ProviderError::Decode(_))));
    }

    #[tokio::test]
    async fn test_track_search_is_empty_without_network() {
        let results = client().search(EntityKind::Track, "Lithium").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_track_get_is_unsupported() {
        let err = client().get(EntityKind::Track, "1").await.unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedOperation { .. }));
    }
}
