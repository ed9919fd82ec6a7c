//! MusicBrainz HTTP client
//!
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.
//! The executor enforces [`DEFAULT_MIN_INTERVAL`] unless configured otherwise.
//!
//! The web service answers in XML by default and in JSON with `fmt=json`.
//! Both content modes are supported; XML bodies are read through
//! [`super::xml_dto`] into the same DTOs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{adapter, dto, xml_dto};
use crate::model::{CanonicalRecord, EntityKind};
use crate::provider::request::{Body, ContentMode, ExecutorConfig, HttpExecutor, RequestSpec};
use crate::provider::{MetadataProvider, Operation, ProviderError, ResponseValidator};

/// Default API root
pub const DEFAULT_BASE_URI: &str = "https://musicbrainz.org/ws/2/";

/// MusicBrainz allows one request per second per client
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

const SEARCH_LIMIT: &str = "25";

/// MusicBrainz API client
pub struct MusicBrainzClient {
    name: String,
    executor: HttpExecutor,
    validator: Arc<ResponseValidator>,
}

impl MusicBrainzClient {
    /// Create a client registered under `name`. MusicBrainz needs no token.
    pub fn new(
        name: &str,
        mut config: ExecutorConfig,
        validator: Arc<ResponseValidator>,
    ) -> Result<Self, ProviderError> {
        match config.content {
            ContentMode::Json => {
                config.query.entry("fmt".to_string()).or_insert_with(|| "json".to_string());
            }
            ContentMode::Xml => {}
            other => {
                return Err(ProviderError::decode(format!(
                    "MusicBrainz responses are read as JSON or XML, not {other:?}"
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            executor: HttpExecutor::new(&config)?,
            validator,
        })
    }

    async fn search_entity(&self, entity: &str, query: &str) -> Result<Body, ProviderError> {
        self.executor
            .execute(RequestSpec::query(entity, [("query", query), ("limit", SEARCH_LIMIT)]))
            .await
    }

    async fn lookup(&self, entity: &str, id: &str, inc: Option<&str>) -> Result<Body, ProviderError> {
        let path = format!("{entity}/{}", urlencoding::encode(id));
        let spec = match inc {
            Some(inc) => RequestSpec::query(path, [("inc", inc)]),
            None => RequestSpec::path(path),
        };
        self.executor.execute(spec).await
    }
}

#[async_trait]
impl MetadataProvider for MusicBrainzClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, _kind: EntityKind, _operation: Operation) -> bool {
        true
    }

    async fn search(&self, kind: EntityKind, query: &str) -> Result<Vec<CanonicalRecord>, ProviderError> {
        let records = match kind {
            EntityKind::Artist => {
                let body = self.search_entity("artist", query).await?;
                let response: dto::ArtistSearchResponse = read::<_, xml_dto::ArtistSearch>(body)?;
                adapter::search_artists(&self.name, response)?
            }
            EntityKind::Album => {
                let body = self.search_entity("release-group", query).await?;
                let response: dto::ReleaseGroupSearchResponse = read::<_, xml_dto::ReleaseGroupSearch>(body)?;
                adapter::search_albums(&self.name, response)?
            }
            EntityKind::Track => {
                let body = self.search_entity("recording", query).await?;
                let response: dto::RecordingSearchResponse = read::<_, xml_dto::RecordingSearch>(body)?;
                adapter::search_tracks(&self.name, response)?
            }
        };
        self.validator.check_results(kind, records)
    }

    async fn get(&self, kind: EntityKind, native_id: &str) -> Result<CanonicalRecord, ProviderError> {
        let record: CanonicalRecord = match kind {
            EntityKind::Artist => {
                let body = self.lookup("artist", native_id, None).await?;
                let artist: dto::Artist = read::<_, xml_dto::ArtistLookup>(body)?;
                adapter::to_artist(&self.name, artist)?.into()
            }
            EntityKind::Album => {
                let body = self
                    .lookup("release", native_id, Some("artist-credits+labels+recordings+genres"))
                    .await?;
                let release: dto::Release = read::<_, xml_dto::ReleaseLookup>(body)?;
                adapter::to_album(&self.name, release)?.into()
            }
            EntityKind::Track => {
                let body = self.lookup("recording", native_id, Some("artist-credits")).await?;
                let recording: dto::Recording = read::<_, xml_dto::RecordingLookup>(body)?;
                adapter::to_track(&self.name, recording)?.into()
            }
        };
        self.validator.check_record(record)
    }
}

/// Read a JSON body directly, or an XML body through its XML shape `X`.
fn read<J, X>(body: Body) -> Result<J, ProviderError>
where
    J: DeserializeOwned,
    X: DeserializeOwned + Into<J>,
{
    match body {
        Body::Xml(_) => Ok(body.parse::<xml_dto::Document<X>>()?.metadata.into()),
        body => body.parse(),
    }
}
