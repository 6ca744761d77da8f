use embedit_extract::models::{Kind, Metadata};
use exn::ResultExt;
use time::UtcDateTime;

use crate::error::{Error, ErrorKind};

/// A cached metadata value, together with when it stops being fresh.
///
/// The store hands entries back regardless of expiry; whether a stale entry is
/// still good enough is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub metadata: Metadata,
    pub expires_at: UtcDateTime,
    pub cached_at: UtcDateTime,
}
impl CacheEntry {
    /// Fresh strictly *before* the expiry timestamp.
    pub fn is_fresh_at(&self, now: UtcDateTime) -> bool {
        now < self.expires_at
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(UtcDateTime::now())
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EmbedRow {
    pub(crate) url: String,
    pub(crate) kind: String,
    pub(crate) data: String,
    pub(crate) expires_at: i64,
    pub(crate) cached_at: i64,
}
impl EmbedRow {
    pub(crate) fn new(url: &str, metadata: &Metadata, cached_at: i64, expires_at: i64) -> Result<Self, Error> {
        Ok(Self {
            url: url.to_string(),
            kind: metadata.kind().as_str().to_string(),
            data: metadata.to_json().or_raise(|| ErrorKind::InvalidData("data"))?,
            expires_at,
            cached_at,
        })
    }
}
impl TryFrom<EmbedRow> for CacheEntry {
    type Error = Error;
    fn try_from(row: EmbedRow) -> Result<Self, Self::Error> {
        // The tag decides how the body is read; never guess it from the body.
        let kind: Kind = row.kind.parse::<Kind>().or_raise(|| ErrorKind::UnknownKind(row.kind.clone()))?;
        Ok(Self {
            metadata: Metadata::from_json(kind, &row.data).or_raise(|| ErrorKind::InvalidData("data"))?,
            expires_at: UtcDateTime::from_unix_timestamp(row.expires_at)
                .or_raise(|| ErrorKind::InvalidData("expires_at"))?,
            cached_at: UtcDateTime::from_unix_timestamp(row.cached_at)
                .or_raise(|| ErrorKind::InvalidData("cached_at"))?,
        })
    }
}
