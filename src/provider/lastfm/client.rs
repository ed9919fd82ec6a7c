//! Last.fm HTTP client
//!
//! Every call goes to the API root with a `method` parameter. The API key
//! and `format=json` ride along as default query parameters.
//!
//! Last.fm reports most failures with HTTP 200 and an error body, which is
//! mapped to a transport error here.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{adapter, dto};
use crate::model::{AlbumRef, CanonicalRecord, EntityKind};
use crate::provider::request::{ContentMode, ExecutorConfig, HttpExecutor, RequestSpec};
use crate::provider::{MetadataProvider, Operation, ProviderError, ResponseValidator};

/// Default API root
pub const DEFAULT_BASE_URI: &str = "http://ws.audioscrobbler.com/2.0/";

/// Albums fetched in full when building an artist record
const TOP_ALBUM_LIMIT: usize = 10;

/// Last.fm API client
pub struct LastFmClient {
    name: String,
    executor: HttpExecutor,
    validator: Arc<ResponseValidator>,
}

impl LastFmClient {
    /// Create a client registered under `name`. `token` is the API key.
    pub fn new(
        name: &str,
        mut config: ExecutorConfig,
        token: Option<&str>,
        validator: Arc<ResponseValidator>,
    ) -> Result<Self, ProviderError> {
        if config.content != ContentMode::Json {
            return Err(ProviderError::decode(format!(
                "Last.fm responses are only read as JSON, not {:?}",
                config.content
            )));
        }
        if let Some(key) = token.filter(|t| !t.is_empty()) {
            config.query.insert("api_key".to_string(), key.to_string());
        }
        config
            .query
            .entry("format".to_string())
            .or_insert_with(|| "json".to_string());

        Ok(Self {
            name: name.to_string(),
            executor: HttpExecutor::new(&config)?,
            validator,
        })
    }

    /// Call one API method and parse the result.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T, ProviderError> {
        let mut query = vec![("method".to_string(), method.to_string())];
        query.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let tree = self
            .executor
            .execute(RequestSpec::PathWithQuery(String::new(), query))
            .await?
            .into_tree()?;
        check_api_error(&tree)?;
        serde_json::from_value(tree).map_err(|e| ProviderError::invalid(e.to_string()))
    }

    async fn get_artist(&self, mbid: &str) -> Result<CanonicalRecord, ProviderError> {
        let limit = TOP_ALBUM_LIMIT.to_string();
        let (info, top) = future::try_join(
            self.call::<dto::ArtistInfoResponse>("artist.getinfo", &[("mbid", mbid)]),
            self.call::<dto::TopAlbumsResponse>("artist.gettopalbums", &[("mbid", mbid), ("limit", limit.as_str())]),
        )
        .await?;

        let lookups = top
            .topalbums
            .album
            .into_vec()
            .into_iter()
            .filter(|album| !album.mbid.is_empty())
            .take(TOP_ALBUM_LIMIT)
            .map(|album| async move {
                let result = self
                    .call::<dto::AlbumInfoResponse>("album.getinfo", &[("mbid", album.mbid.as_str())])
                    .await;
                (album.name, result)
            });

        let mut albums: Vec<AlbumRef> = Vec::new();
        for (name, result) in future::join_all(lookups).await {
            match result.and_then(|r| adapter::to_album_ref(&self.name, r.album)) {
                Ok(Some(album)) => albums.push(album),
                Ok(None) => tracing::debug!(album = %name, "Skipping album without tracklist"),
                Err(e) => tracing::debug!(album = %name, error = %e, "Skipping album lookup"),
            }
        }

        Ok(adapter::to_artist(&self.name, mbid, info.artist, albums)?.into())
    }

    async fn get_album(&self, mbid: &str) -> Result<CanonicalRecord, ProviderError> {
        let response: dto::AlbumInfoResponse = self.call("album.getinfo", &[("mbid", mbid)]).await?;
        Ok(adapter::to_album(&self.name, mbid, response.album)?.into())
    }

    async fn get_track(&self, mbid: &str) -> Result<CanonicalRecord, ProviderError> {
        let response: dto::TrackInfoResponse = self.call("track.getinfo", &[("mbid", mbid)]).await?;
        Ok(adapter::to_track(&self.name, mbid, response.track)?.into())
    }
}

/// Map Last.fm's in-band error body to a transport error.
fn check_api_error(tree: &Value) -> Result<(), ProviderError> {
    if tree.get("error").is_none() {
        return Ok(());
    }
    match serde_json::from_value::<dto::ApiError>(tree.clone()) {
        Ok(err) => Err(ProviderError::transport(format!("Last.fm error {}: {}", err.error, err.message))),
        Err(_) => Err(ProviderError::transport(format!("Last.fm error: {}", tree["error"]))),
    }
}

#[async_trait]
impl MetadataProvider for LastFmClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, _kind: EntityKind, _operation: Operation) -> bool {
        true
    }

    async fn search(&self, kind: EntityKind, query: &str) -> Result<Vec<CanonicalRecord>, ProviderError> {
        let records = match kind {
            EntityKind::Artist => {
                let response = self.call("artist.search", &[("artist", query)]).await?;
                adapter::search_artists(&self.name, response)?
            }
            EntityKind::Album => {
                let response = self.call("album.search", &[("album", query)]).await?;
                adapter::search_albums(&self.name, response)?
            }
            EntityKind::Track => {
                let response = self.call("track.search", &[("track", query)]).await?;
                adapter::search_tracks(&self.name, response)?
            }
        };
        self.validator.check_results(kind, records)
    }

    async fn get(&self, kind: EntityKind, native_id: &str) -> Result<CanonicalRecord, ProviderError> {
        let record = match kind {
            EntityKind::Artist => self.get_artist(native_id).await?,
            EntityKind::Album => self.get_album(native_id).await?,
            EntityKind::Track => self.get_track(native_id).await?,
        };
        self.validator.check_record(record)
    }
}
