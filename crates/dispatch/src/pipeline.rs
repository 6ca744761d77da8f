use embedit_cache::{CacheEntry, Repository};
use embedit_extract::models::Metadata;
use embedit_extract::{CanonicalUrl, Provider, Registry};
use exn::OptionExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::agent::BotClassifier;
use crate::error::{ErrorKind, Result};
use crate::locks::KeyedLocks;
use crate::oembed::{OEmbed, decode_author};

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Extracted,
}

/// Metadata for a request URL, plus the cache key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub url: CanonicalUrl,
    pub metadata: Metadata,
    pub source: Source,
}

/// What to send back to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Render the metadata inline for a crawler.
    Embed(Resolved),
    /// Send a person on to the post itself.
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Cache lifetime of a fresh extraction, unless the provider asks for less.
    pub ttl: Duration,
    /// Upper bound on a single extraction.
    pub extract_timeout: Duration,
    /// `provider_name` in oEmbed records, and the prefix of their title.
    pub name: String,
    /// `provider_url` in oEmbed records.
    pub homepage: String,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60 * 24),
            extract_timeout: Duration::from_secs(20),
            name: "embedit".to_string(),
            homepage: String::new(),
        }
    }
}

/// Resolves post URLs: cache first, then the matching provider, then back into
/// the cache.
///
/// ```text
/// lookup ─┬─ fresh hit ────────────────────────────────────┬─> render
///         └─ miss/stale ─> match ─┬─ provider ─> extract ──┤   (embed or redirect)
///                                 │              └─ error ─┴─> error
///                                 └─ none ──────────────────> not found
/// ```
///
/// Extraction of any one URL is single-flight: concurrent requests for the
/// same key queue on a per-key lock and re-check the cache once they hold it.
pub struct Dispatcher {
    registry: Arc<Registry>,
    cache: Repository,
    bots: BotClassifier,
    settings: Settings,
    locks: KeyedLocks,
}
impl Dispatcher {
    pub fn new(registry: Arc<Registry>, cache: Repository, bots: BotClassifier, settings: Settings) -> Self {
        Self {
            registry,
            cache,
            bots,
            settings,
            locks: KeyedLocks::default(),
        }
    }

    fn canonicalize(raw_url: &str) -> Result<CanonicalUrl> {
        CanonicalUrl::parse(raw_url).map_err(|err| {
            let kind = ErrorKind::from(&*err);
            err.raise(kind)
        })
    }

    async fn cached(&self, url: &CanonicalUrl) -> Result<Option<CacheEntry>> {
        self.cache.get(url.as_str()).await.map_err(|err| {
            let kind = ErrorKind::from(&*err);
            if kind == ErrorKind::CacheCorruption {
                tracing::error!(%url, error = ?err, "corrupt cache entry");
            }
            err.raise(kind)
        })
    }

    async fn fresh(&self, url: &CanonicalUrl) -> Result<Option<Resolved>> {
        Ok(match self.cached(url).await? {
            Some(entry) if entry.is_fresh() => {
                tracing::debug!(%url, "cache hit");
                Some(Resolved {
                    url: url.clone(),
                    metadata: entry.metadata,
                    source: Source::Cache,
                })
            },
            Some(_) => {
                tracing::debug!(%url, "cache entry expired");
                None
            },
            None => {
                tracing::debug!(%url, "cache miss");
                None
            },
        })
    }

    /// Resolve a request URL to metadata, extracting it on a cache miss.
    #[instrument(skip(self))]
    pub async fn resolve(&self, raw_url: &str) -> Result<Resolved> {
        let url = Self::canonicalize(raw_url)?;
        if let Some(resolved) = self.fresh(&url).await? {
            return Ok(resolved);
        }
        let provider = self.registry.find_provider(&url).ok_or_raise(|| ErrorKind::NotFound)?;

        let _guard = self.locks.lock(url.as_str()).await;
        // Whoever held the lock before us may have just filled the cache.
        if let Some(resolved) = self.fresh(&url).await? {
            return Ok(resolved);
        }
        let metadata = self.extract(provider.as_ref(), &url).await?;
        let ttl = provider.ttl(&metadata).map_or(self.settings.ttl, |ttl| ttl.min(self.settings.ttl));
        // Serving the fresh result matters more than caching it.
        if let Err(err) = self.cache.put(url.as_str(), &metadata, ttl).await {
            tracing::warn!(%url, error = ?err, "failed to cache extracted metadata");
        }
        Ok(Resolved {
            url,
            metadata,
            source: Source::Extracted,
        })
    }

    async fn extract(&self, provider: &dyn Provider, url: &CanonicalUrl) -> Result<Metadata> {
        tracing::debug!(%url, provider = provider.name(), "extracting");
        match tokio::time::timeout(self.settings.extract_timeout, provider.extract(url)).await {
            Ok(Ok(metadata)) => Ok(metadata),
            Ok(Err(err)) => {
                let kind = ErrorKind::from(&*err);
                tracing::warn!(%url, provider = provider.name(), error = ?err, "extraction failed");
                Err(err.raise(kind))
            },
            Err(_elapsed) => {
                let timeout = self.settings.extract_timeout;
                tracing::warn!(%url, provider = provider.name(), ?timeout, "extraction timed out");
                exn::bail!(ErrorKind::Upstream)
            },
        }
    }

    /// Resolve, then decide between an inline embed and a redirect based on
    /// who is asking. The decision doesn't depend on where the data came from.
    #[instrument(skip(self))]
    pub async fn dispatch(&self, raw_url: &str, user_agent: Option<&str>) -> Result<Outcome> {
        let resolved = self.resolve(raw_url).await?;
        Ok(self.outcome(resolved, user_agent))
    }

    /// Embed for crawlers, redirect for everyone else.
    pub fn outcome(&self, resolved: Resolved, user_agent: Option<&str>) -> Outcome {
        if self.bots.is_bot(user_agent) {
            Outcome::Embed(resolved)
        } else {
            Outcome::Redirect(resolved.metadata.canonical_url().to_string())
        }
    }

    /// Build the oEmbed record for an already cached URL. Never extracts; an
    /// expired entry is still good enough for this.
    #[instrument(skip(self))]
    pub async fn oembed(&self, raw_url: &str, author_token: Option<&str>) -> Result<OEmbed> {
        let url = Self::canonicalize(raw_url)?;
        let entry = self.cached(&url).await?.ok_or_raise(|| ErrorKind::NotFound)?;
        let common = entry.metadata.common();
        let author_name = author_token.and_then(decode_author).unwrap_or_else(|| common.author_name.clone());
        Ok(OEmbed {
            author_name,
            author_url: common.author_url.clone(),
            provider_name: self.settings.name.clone(),
            provider_url: self.settings.homepage.clone(),
            title: format!("{} - {}", self.settings.name, common.title),
            kind: "link",
            version: "1.0",
        })
    }
}
