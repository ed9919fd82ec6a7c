//! Test utilities and fixtures for music-meta-cache tests.
//!
//! This module provides common test helpers, fake repositories, a local
//! HTTP stub, and database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use music_meta_cache::test_utils::{temp_db, InMemoryRepository};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let repository = Arc::new(InMemoryRepository::new());
//!     // ... test logic
//! }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::catalog::RecordRepository;
use crate::error::{Error, Result};
use crate::model::{Album, AlbumArtist, CachedRecord, CachedSearch, CanonicalRecord, EntityKind, ProviderIds, Track};

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// # Returns
///
/// A tuple of (connection pool, temp directory handle).
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = crate::db::db_url(Some(&db_path));

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// A [`RecordRepository`] held in memory, with call counters.
///
/// Mirrors the SQLite repository: a provider key always points at the most
/// recently written record that carries it, and aliases only answer keys
/// no record carries.
#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<Vec<CachedRecord>>,
    aliases: Mutex<HashMap<(EntityKind, String, String), i64>>,
    searches: Mutex<HashMap<(EntityKind, String), CachedSearch>>,
    next_key: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn find_by_provider_id(
        &self,
        kind: EntityKind,
        provider: &str,
        native_id: &str,
    ) -> Result<Option<CachedRecord>> {
        let records = self.records.lock();
        let carried = records.iter().rev().find(|r| {
            r.kind() == kind && r.record.provider_ids().get(provider).map(String::as_str) == Some(native_id)
        });
        if let Some(found) = carried {
            return Ok(Some(found.clone()));
        }

        let alias = (kind, provider.to_string(), native_id.to_string());
        let Some(key) = self.aliases.lock().get(&alias).copied() else {
            return Ok(None);
        };
        Ok(records.iter().find(|r| r.key == key && r.kind() == kind).cloned())
    }

    async fn insert(
        &self,
        _kind: EntityKind,
        record: &CanonicalRecord,
        last_update: DateTime<Utc>,
    ) -> Result<CachedRecord> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let key = self.next_key.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let cached = CachedRecord {
            key,
            record: record.clone(),
            last_update,
        };
        self.records.lock().push(cached.clone());
        Ok(cached)
    }

    async fn update(
        &self,
        kind: EntityKind,
        key: i64,
        record: &CanonicalRecord,
        last_update: DateTime<Utc>,
    ) -> Result<CachedRecord> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock();
        let position = records
            .iter()
            .position(|r| r.key == key && r.kind() == kind)
            .ok_or_else(|| Error::Database(sqlx::Error::RowNotFound))?;

        // Move to the back so lookups prefer the freshest write
        records.remove(position);
        let cached = CachedRecord {
            key,
            record: record.clone(),
            last_update,
        };
        records.push(cached.clone());
        Ok(cached)
    }

    async fn add_alias(&self, kind: EntityKind, key: i64, provider: &str, native_id: &str) -> Result<()> {
        self.aliases
            .lock()
            .insert((kind, provider.to_string(), native_id.to_string()), key);
        Ok(())
    }

    async fn find_search(&self, kind: EntityKind, query: &str) -> Result<Option<CachedSearch>> {
        Ok(self.searches.lock().get(&(kind, query.to_string())).cloned())
    }

    async fn save_search(
        &self,
        kind: EntityKind,
        query: &str,
        results: &[CanonicalRecord],
        last_update: DateTime<Utc>,
    ) -> Result<()> {
        let cached = CachedSearch {
            results: results.to_vec(),
            last_update,
        };
        self.searches.lock().insert((kind, query.to_string()), cached);
        Ok(())
    }
}

// ============================================================================
// Local HTTP stub
// ============================================================================

/// A request received by a [`StubServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, as sent
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    /// Decoded query parameters, in order.
    pub fn query(&self) -> Vec<(String, String)> {
        let url = reqwest::Url::parse(&format!("http://stub{}", self.target)).expect("valid request target");
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    pub fn query_value(&self, name: &str) -> Option<String> {
        self.query().into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The canned answer to a request.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn ok(content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::ok("application/json", body)
    }

    pub fn xml(body: impl Into<String>) -> Self {
        Self::ok("application/xml", body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            ..Self::ok("text/plain", body)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = Arc<dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync>;

/// A one-connection-per-request HTTP/1.1 server on a random local port.
///
/// Every request is recorded and answered by the handler. The server stops
/// when dropped.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(handler: impl Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let _ = serve(stream, recorded, handler).await;
                });
            }
        });

        Self { addr, requests, task }
    }

    /// Answer every request with the same response.
    pub async fn always(response: StubResponse) -> Self {
        Self::start(move |_| response.clone()).await
    }

    /// Absolute URL of `path` on this server, e.g. `http://127.0.0.1:4711/ws/2/`.
    pub fn uri(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    handler: Handler,
) -> std::io::Result<()> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        raw.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&raw).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let request = RecordedRequest {
        method: request_line.next().unwrap_or_default().to_string(),
        target: request_line.next().unwrap_or_default().to_string(),
        headers: lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect(),
        received_at: Instant::now(),
    };
    recorded.lock().push(request.clone());

    let response = (*handler)(&request);
    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let reply = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.content_type,
        response.body.len(),
        response.body
    );
    stream.write_all(reply.as_bytes()).await?;
    stream.shutdown().await
}

/// Creates an album record with a credited artist and two tracks.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let album = Album { year: None, ..mock_album("discogs", "1") };
/// ```
pub fn mock_album(provider: &str, native_id: &str) -> Album {
    let track = |n: u32| Track {
        id: format!("{provider}-{native_id}:{n}"),
        title: format!("Track {n}"),
        explicit: None,
        provider_ids: ProviderIds::new(),
    };
    Album {
        id: format!("{provider}-{native_id}"),
        album_name: "Test Album".to_string(),
        artist: Some(AlbumArtist {
            id: Some(format!("{provider}-artist")),
            artist_name: "Test Artist".to_string(),
            artist_url: None,
        }),
        year: Some(2023),
        genres: None,
        overview: None,
        labels: None,
        images: None,
        tracks: Some(vec![track(1), track(2)]),
        provider_ids: ProviderIds::from([(provider.to_string(), native_id.to_string())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRepository;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        let repository = SqliteRepository::new(pool);
        assert_eq!(repository.count(EntityKind::Album).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_in_memory_update_keeps_key() {
        let repository = InMemoryRepository::new();
        let album: CanonicalRecord = mock_album("p", "1").into();

        let inserted = repository.insert(EntityKind::Album, &album, Utc::now()).await.unwrap();
        let updated = repository
            .update(EntityKind::Album, inserted.key, &album, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.key, inserted.key);
        assert_eq!(repository.len(), 1);
        assert_eq!(repository.insert_count(), 1);
        assert_eq!(repository.update_count(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_find_is_scoped_by_kind() {
        let repository = InMemoryRepository::new();
        let album: CanonicalRecord = mock_album("p", "1").into();
        repository.insert(EntityKind::Album, &album, Utc::now()).await.unwrap();

        assert!(
            repository
                .find_by_provider_id(EntityKind::Album, "p", "1")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            repository
                .find_by_provider_id(EntityKind::Artist, "p", "1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_in_memory_update_missing_key_fails() {
        let repository = InMemoryRepository::new();
        let album: CanonicalRecord = mock_album("p", "1").into();
        let result = repository.update(EntityKind::Album, 99, &album, Utc::now()).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_in_memory_alias_yields_to_carried_ids() {
        let repository = InMemoryRepository::new();
        let first = repository
            .insert(EntityKind::Album, &mock_album("p", "1").into(), Utc::now())
            .await
            .unwrap();
        let second = repository
            .insert(EntityKind::Album, &mock_album("p", "2").into(), Utc::now())
            .await
            .unwrap();

        repository.add_alias(EntityKind::Album, first.key, "p", "old").await.unwrap();
        repository.add_alias(EntityKind::Album, first.key, "p", "2").await.unwrap();

        let by_alias = repository.find_by_provider_id(EntityKind::Album, "p", "old").await.unwrap();
        assert_eq!(by_alias.map(|r| r.key), Some(first.key));
        let carried = repository.find_by_provider_id(EntityKind::Album, "p", "2").await.unwrap();
        assert_eq!(carried.map(|r| r.key), Some(second.key));
    }

    #[tokio::test]
    async fn test_stub_server_records_and_answers() {
        let server = StubServer::start(|request| {
            if request.path() == "/missing" {
                StubResponse::status(404, "nope")
            } else {
                StubResponse::json(r#"{"ok":true}"#)
            }
        })
        .await;

        let client = reqwest::Client::new();
        let ok = client
            .get(server.uri("things?q=a%20b"))
            .header("X-Test", "1")
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status().as_u16(), 200);
        assert_eq!(ok.text().await.unwrap(), r#"{"ok":true}"#);

        let missing = client.get(server.uri("missing")).send().await.unwrap();
        assert_eq!(missing.status().as_u16(), 404);

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path(), "/things");
        assert_eq!(requests[0].query_value("q").as_deref(), Some("a b"));
        assert_eq!(requests[0].header("x-test"), Some("1"));
    }

    #[test]
    fn test_mock_album_defaults() {
        let album = mock_album("discogs", "7");
        assert_eq!(album.id, "discogs-7");
        assert_eq!(album.tracks.as_ref().map(Vec::len), Some(2));
        assert_eq!(album.provider_ids.get("discogs").map(String::as_str), Some("7"));
    }
}
