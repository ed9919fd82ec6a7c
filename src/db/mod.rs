//! Database module for cached record persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Records are stored as their canonical JSON, with a side table mapping
//! every `(kind, provider, native id)` key to the record that carries it
//! (or, for alias rows, the record it was answered with). Search result
//! lists live in their own table keyed by `(kind, query)`.
//!
//! # Example
//!
//! ```ignore
//! use music_meta_cache::db::{db_url, init_db, SqliteRepository};
//!
//! let pool = init_db(&db_url(Some(path))).await?;
//! let repository = SqliteRepository::new(pool);
//! let cached = repository.find_by_provider_id(EntityKind::Artist, "discogs", "45").await?;
//! ```

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::catalog::RecordRepository;
use crate::error::{Error, Result, ResultExt};
use crate::model::{CachedRecord, CachedSearch, CanonicalRecord, EntityKind};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "music_meta_cache.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        Sqlite::create_database(db_url)
            .await
            .with_context(format!("creating database {db_url}"))?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// SQLite-backed [`RecordRepository`].
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of cached records of `kind`.
    pub async fn count(&self, kind: EntityKind) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE kind = ?")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl RecordRepository for SqliteRepository {
    async fn find_by_provider_id(
        &self,
        kind: EntityKind,
        provider: &str,
        native_id: &str,
    ) -> Result<Option<CachedRecord>> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT r.id, r.payload, r.last_update
             FROM records r
             JOIN record_provider_ids p ON p.record_id = r.id
             WHERE p.kind = ? AND p.provider = ? AND p.native_id = ?",
        )
        .bind(kind.as_str())
        .bind(provider)
        .bind(native_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(key, payload, last_update)| to_cached(kind, key, &payload, &last_update))
            .transpose()
    }

    async fn insert(
        &self,
        kind: EntityKind,
        record: &CanonicalRecord,
        last_update: DateTime<Utc>,
    ) -> Result<CachedRecord> {
        let payload = serde_json::to_string(record)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO records (kind, payload, last_update) VALUES (?, ?, ?)")
            .bind(kind.as_str())
            .bind(&payload)
            .bind(timestamp(last_update))
            .execute(&mut *tx)
            .await?;
        let key = result.last_insert_rowid();

        index_provider_ids(&mut tx, kind, key, record).await?;
        tx.commit().await?;

        Ok(CachedRecord {
            key,
            record: record.clone(),
            last_update,
        })
    }

    async fn update(
        &self,
        kind: EntityKind,
        key: i64,
        record: &CanonicalRecord,
        last_update: DateTime<Utc>,
    ) -> Result<CachedRecord> {
        let payload = serde_json::to_string(record)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE records SET payload = ?, last_update = ? WHERE id = ? AND kind = ?")
            .bind(&payload)
            .bind(timestamp(last_update))
            .bind(key)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(Error::Database(sqlx::Error::RowNotFound).context(format!("updating {kind} record {key}")));
        }

        sqlx::query("DELETE FROM record_provider_ids WHERE record_id = ? AND alias = 0")
            .bind(key)
            .execute(&mut *tx)
            .await?;
        index_provider_ids(&mut tx, kind, key, record).await?;
        tx.commit().await?;

        Ok(CachedRecord {
            key,
            record: record.clone(),
            last_update,
        })
    }

    async fn add_alias(&self, kind: EntityKind, key: i64, provider: &str, native_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO record_provider_ids (record_id, kind, provider, native_id, alias)
             VALUES (?, ?, ?, ?, 1)
             ON CONFLICT (kind, provider, native_id) DO UPDATE SET record_id = excluded.record_id
             WHERE record_provider_ids.alias = 1",
        )
        .bind(key)
        .bind(kind.as_str())
        .bind(provider)
        .bind(native_id)
        .execute(&self.pool)
        .await
        .with_context(format!("aliasing {provider} {native_id} to {kind} record {key}"))?;
        Ok(())
    }

    async fn find_search(&self, kind: EntityKind, query: &str) -> Result<Option<CachedSearch>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT payload, last_update FROM search_results WHERE kind = ? AND query = ?")
                .bind(kind.as_str())
                .bind(query)
                .fetch_optional(&self.pool)
                .await?;

        let Some((payload, last_update)) = row else {
            return Ok(None);
        };
        let values: Vec<serde_json::Value> = serde_json::from_str(&payload)?;
        let results = values
            .into_iter()
            .map(|value| CanonicalRecord::from_value(kind, value))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(CachedSearch {
            results,
            last_update: parse_timestamp(&last_update)?,
        }))
    }

    async fn save_search(
        &self,
        kind: EntityKind,
        query: &str,
        results: &[CanonicalRecord],
        last_update: DateTime<Utc>,
    ) -> Result<()> {
        let payload = serde_json::to_string(results)?;
        sqlx::query(
            "INSERT INTO search_results (kind, query, payload, last_update) VALUES (?, ?, ?, ?)
             ON CONFLICT (kind, query) DO UPDATE SET payload = excluded.payload, last_update = excluded.last_update",
        )
        .bind(kind.as_str())
        .bind(query)
        .bind(&payload)
        .bind(timestamp(last_update))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Point every provider key of `record` at `key`.
///
/// A key already held by another record, or by an alias, moves to this one.
async fn index_provider_ids(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
    key: i64,
    record: &CanonicalRecord,
) -> Result<()> {
    for (provider, native_id) in record.provider_ids() {
        sqlx::query(
            "INSERT INTO record_provider_ids (record_id, kind, provider, native_id)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (kind, provider, native_id) DO UPDATE SET record_id = excluded.record_id, alias = 0",
        )
        .bind(key)
        .bind(kind.as_str())
        .bind(provider)
        .bind(native_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_cached(kind: EntityKind, key: i64, payload: &str, last_update: &str) -> Result<CachedRecord> {
    let value: serde_json::Value = serde_json::from_str(payload)?;
    let record = CanonicalRecord::from_value(kind, value)?;
    Ok(CachedRecord {
        key,
        record,
        last_update: parse_timestamp(last_update)?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| Error::Database(sqlx::Error::Decode(Box::new(e))))?
        .with_timezone(&Utc))
}
