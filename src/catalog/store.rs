//! Staleness-aware record store.
//!
//! `get(kind, id)` serves a cached record while it is younger than the
//! expiration window and otherwise refreshes it through the [`Resolver`]:
//!
//! 1. look the id up by its provider-scoped key(s)
//! 2. fresh hit → return it, no network
//! 3. miss or stale → resolve; update the existing record in place (same
//!    primary key) or insert a new one
//! 4. resolution failed → serve the stale record if there is one, otherwise
//!    fail with [`Error::NotFound`]
//!
//! Refreshes of the same `(kind, id)` are serialized by an in-flight lock, so
//! concurrent callers share one resolution instead of racing to upsert.
//!
//! Search result lists are cached per `(kind, query)` under the same window.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::resolver::{LookupTarget, Resolution, Resolver};
use crate::error::{Error, Result};
use crate::model::{CachedRecord, CachedSearch, CanonicalRecord, EntityKind};

/// Persistence boundary for cached records.
///
/// Implemented by [`crate::db::SqliteRepository`]; tests use an in-memory
/// implementation.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// The record of `kind` carrying `provider → native_id` in its provider
    /// ids, or else the record that key is an alias of.
    async fn find_by_provider_id(
        &self,
        kind: EntityKind,
        provider: &str,
        native_id: &str,
    ) -> Result<Option<CachedRecord>>;

    /// Store a new record under a fresh primary key.
    async fn insert(&self, kind: EntityKind, record: &CanonicalRecord, last_update: DateTime<Utc>)
    -> Result<CachedRecord>;

    /// Replace the record stored under `key` wholesale. Aliases survive.
    async fn update(
        &self,
        kind: EntityKind,
        key: i64,
        record: &CanonicalRecord,
        last_update: DateTime<Utc>,
    ) -> Result<CachedRecord>;

    /// Make `provider → native_id` find the record under `key` without adding
    /// it to the record's provider ids. Never shadows a carried provider id.
    async fn add_alias(&self, kind: EntityKind, key: i64, provider: &str, native_id: &str) -> Result<()>;

    async fn find_search(&self, kind: EntityKind, query: &str) -> Result<Option<CachedSearch>>;

    /// Replace the cached results of `(kind, query)`.
    async fn save_search(
        &self,
        kind: EntityKind,
        query: &str,
        results: &[CanonicalRecord],
        last_update: DateTime<Utc>,
    ) -> Result<()>;
}

type RefreshLocks = Mutex<HashMap<(EntityKind, String), Arc<tokio::sync::Mutex<()>>>>;

/// A claim on one key's refresh lock.
///
/// Dropping it, including when the owning future is cancelled, removes the
/// map entry once no other caller holds or waits on it.
struct InFlight<'a> {
    locks: &'a RefreshLocks,
    key: (EntityKind, String),
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // The map's reference plus ours
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 2) {
            locks.remove(&self.key);
        }
    }
}

/// Cache front for the resolver
pub struct RecordStore {
    repository: Arc<dyn RecordRepository>,
    resolver: Resolver,
    expiration: Duration,
    in_flight: RefreshLocks,
}

impl RecordStore {
    pub fn new(repository: Arc<dyn RecordRepository>, resolver: Resolver, expiration: Duration) -> Self {
        Self {
            repository,
            resolver,
            expiration,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Search through the resolver, serving a cached result list while fresh.
    ///
    /// The query is trimmed and otherwise matched exactly. Empty result lists
    /// are not cached; when a stale list can't be refreshed it is served.
    pub async fn search(&self, kind: EntityKind, query: &str) -> Result<Vec<CanonicalRecord>> {
        let query = query.trim();
        let cached = self.repository.find_search(kind, query).await?;
        if let Some(cached) = &cached
            && self.within_window(cached.age(Utc::now()))
        {
            tracing::debug!(%kind, query, results = cached.results.len(), "Search cache hit");
            return Ok(cached.results.clone());
        }

        let results = self.resolver.search(kind, query).await;
        if results.is_empty() {
            if let Some(stale) = cached {
                tracing::warn!(%kind, query, "Search refresh found nothing, serving stale results");
                return Ok(stale.results);
            }
            return Ok(results);
        }

        self.repository.save_search(kind, query, &results, Utc::now()).await?;
        tracing::debug!(%kind, query, results = results.len(), "Cached search results");
        Ok(results)
    }

    /// Fetch a record, from cache when fresh.
    pub async fn get(&self, kind: EntityKind, id: &str) -> Result<CachedRecord> {
        let target = self.resolver.target(id);

        if let Some(cached) = self.lookup(kind, &target).await?
            && self.is_fresh(&cached, Utc::now())
        {
            tracing::debug!(%kind, id, "Cache hit");
            return Ok(cached);
        }

        let in_flight = self.claim(kind, id);
        let _guard = in_flight.lock.lock().await;
        self.refresh(kind, id, &target).await
    }

    /// Fetch several records, one after another.
    ///
    /// Ids are trimmed, blank ids dropped and repeats collapsed; ids that
    /// resolve to an already returned record are skipped too. Ids nothing
    /// resolves are left out of the result. Fails with
    /// [`Error::InvalidInput`] when no usable id remains.
    pub async fn get_many<I, S>(&self, kind: EntityKind, ids: I) -> Result<Vec<CachedRecord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = clean_ids(ids);
        if ids.is_empty() {
            return Err(Error::invalid_input("no valid ids"));
        }

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.get(kind, id).await {
                Ok(cached) => {
                    if seen.insert(cached.key) {
                        records.push(cached);
                    }
                }
                Err(e) if e.is_not_found() => tracing::debug!(%kind, id = %id, "Skipping unresolved id"),
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Resolve and persist, holding the key's refresh lock.
    async fn refresh(&self, kind: EntityKind, id: &str, target: &LookupTarget) -> Result<CachedRecord> {
        // Another caller may have refreshed while we waited for the lock
        let cached = self.lookup(kind, target).await?;
        if let Some(cached) = &cached
            && self.is_fresh(cached, Utc::now())
        {
            tracing::debug!(%kind, id, "Refreshed by a concurrent request");
            return Ok(cached.clone());
        }

        match self.resolver.get(kind, id).await {
            Resolution::Found { record, provider } => {
                let now = Utc::now();
                let existing = match cached {
                    Some(c) => Some(c),
                    None => self.lookup_by_record(kind, &record).await?,
                };
                let stored = match existing {
                    Some(previous) => {
                        tracing::info!(%kind, id, %provider, key = previous.key, "Refreshed cached record");
                        self.repository.update(kind, previous.key, &record, now).await?
                    }
                    None => {
                        let stored = self.repository.insert(kind, &record, now).await?;
                        tracing::info!(%kind, id, %provider, key = stored.key, "Cached new record");
                        stored
                    }
                };

                // The provider may answer under another native id (merged or
                // redirected ids); keep the requested key pointing here
                if let Some(native_id) = target.native_id_for(&provider)
                    && record.provider_ids().get(&provider).map(String::as_str) != Some(native_id)
                {
                    tracing::debug!(%kind, id, %provider, key = stored.key, "Indexing requested id as alias");
                    self.repository.add_alias(kind, stored.key, &provider, native_id).await?;
                }
                Ok(stored)
            }
            Resolution::NotFound { attempts } => match cached {
                Some(stale) => {
                    tracing::warn!(
                        %kind,
                        id,
                        age_secs = stale.age(Utc::now()).num_seconds(),
                        attempts = attempts.len(),
                        "Refresh failed, serving stale record"
                    );
                    Ok(stale)
                }
                None => {
                    tracing::debug!(%kind, id, attempts = attempts.len(), "Not found anywhere");
                    Err(Error::not_found(kind, id))
                }
            },
        }
    }

    /// Cached record for the id's provider-scoped key(s).
    ///
    /// Agnostic ids are tried under every provider in the kind's chain.
    async fn lookup(&self, kind: EntityKind, target: &LookupTarget) -> Result<Option<CachedRecord>> {
        match target {
            LookupTarget::Scoped { provider, native_id } => {
                self.repository.find_by_provider_id(kind, provider, native_id).await
            }
            LookupTarget::Agnostic(native_id) => {
                for provider in self.resolver.registry().chain(kind) {
                    if let Some(found) = self
                        .repository
                        .find_by_provider_id(kind, provider.name(), native_id)
                        .await?
                    {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
        }
    }

    /// An existing record that already carries one of `record`'s provider ids.
    async fn lookup_by_record(&self, kind: EntityKind, record: &CanonicalRecord) -> Result<Option<CachedRecord>> {
        for (provider, native_id) in record.provider_ids() {
            if let Some(found) = self.repository.find_by_provider_id(kind, provider, native_id).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn is_fresh(&self, cached: &CachedRecord, now: DateTime<Utc>) -> bool {
        self.within_window(cached.age(now))
    }

    fn within_window(&self, age: chrono::Duration) -> bool {
        // A timestamp in the future counts as brand new
        age.to_std().unwrap_or(Duration::ZERO) < self.expiration
    }

    fn claim(&self, kind: EntityKind, id: &str) -> InFlight<'_> {
        let key = (kind, id.to_string());
        let lock = Arc::clone(self.in_flight.lock().entry(key.clone()).or_default());
        InFlight {
            locks: &self.in_flight,
            key,
            lock,
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.lock().len()
    }
}

/// Trim, drop blanks and collapse repeats, keeping first-seen order.
fn clean_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}
