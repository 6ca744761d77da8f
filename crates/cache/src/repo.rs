//! Key-value access to cached embeds.

use exn::ResultExt;
use sqlx::SqlitePool;
use std::time::Duration;
use time::UtcDateTime;
use tracing::instrument;

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{CacheEntry, EmbedRow};
use embedit_extract::models::Metadata;

/// Repository of cached embeds, keyed by canonical URL.
///
/// Expiry is recorded but not enforced here: [`get`](Self::get) returns a
/// stored entry whether or not it is still fresh.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up the entry stored under `key`.
    ///
    /// A row tagged with an unknown kind, or whose body does not match its
    /// tag, is an error rather than a miss.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row: Option<EmbedRow> = sqlx::query_as(include_str!("../queries/get_embed.sql"))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(CacheEntry::try_from).transpose()
    }

    /// Store `metadata` under `key` until `now + ttl`, replacing any existing
    /// row for that key in a single statement.
    #[instrument(skip(self, metadata), fields(kind = %metadata.kind(), ttl_secs = ttl.as_secs()))]
    pub async fn put(&self, key: &str, metadata: &Metadata, ttl: Duration) -> Result<CacheEntry> {
        let cached_at = UtcDateTime::now().unix_timestamp();
        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|ttl| cached_at.checked_add(ttl))
            .ok_or_else(|| exn::Exn::from(ErrorKind::InvalidData("ttl")))?;
        let row = EmbedRow::new(key, metadata, cached_at, expires_at)?;
        sqlx::query(include_str!("../queries/upsert_embed.sql"))
            .bind(&row.url)
            .bind(&row.kind)
            .bind(&row.data)
            .bind(row.expires_at)
            .bind(row.cached_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    /// Number of rows that have expired as of `now`. Nothing purges them; they
    /// are only ever replaced by a fresh extraction of the same URL.
    pub async fn count_expired(&self, now: UtcDateTime) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(include_str!("../queries/count_expired.sql"))
            .bind(now.unix_timestamp())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }
}
