//! Dispatch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from the extraction and cache
//! crates are re-raised under one of these kinds, keeping the original error
//! as a child in the tree.

use derive_more::{Display, Error};
use embedit_cache::error::ErrorKind as CacheErrorKind;
use embedit_extract::error::ErrorKind as ExtractErrorKind;

/// A dispatch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What the request ended up as, from the requester's point of view.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// No provider claims the URL, the post doesn't exist upstream, or
    /// (lookup-only) nothing is cached for it.
    #[display("not found")]
    NotFound,
    /// Extraction failed, timed out, or got an unusable answer.
    #[display("could not fetch the post")]
    Upstream,
    #[display("post has no embeddable media: {_0}")]
    NoMatchingVariant(#[error(not(source))] String),
    #[display("{_0} is not supported")]
    Unsupported(#[error(not(source))] String),
    /// The cache holds a row we can't read back.
    #[display("cache entry is corrupt")]
    CacheCorruption,
    /// The cache could not be reached.
    #[display("cache unavailable")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream | Self::Cache)
    }
}

impl From<&ExtractErrorKind> for ErrorKind {
    fn from(kind: &ExtractErrorKind) -> Self {
        match kind {
            ExtractErrorKind::InvalidUrl(url) => Self::InvalidUrl(url.clone()),
            ExtractErrorKind::UpstreamNotFound => Self::NotFound,
            ExtractErrorKind::NoMatchingVariant(reason) => Self::NoMatchingVariant(reason.clone()),
            ExtractErrorKind::Unsupported(provider) => Self::Unsupported(provider.clone()),
            ExtractErrorKind::Upstream
            | ExtractErrorKind::Timeout
            | ExtractErrorKind::MalformedResponse(_)
            | ExtractErrorKind::ToolNotFound(_) => Self::Upstream,
        }
    }
}

impl From<&CacheErrorKind> for ErrorKind {
    fn from(kind: &CacheErrorKind) -> Self {
        if kind.is_corruption() { Self::CacheCorruption } else { Self::Cache }
    }
}
