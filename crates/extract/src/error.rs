//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL could not be parsed, or is not something this provider knows
    /// how to address (e.g. no post ID in it).
    #[display("invalid url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The post exists, but there is no usable media/format variant in it.
    #[display("no matching media variant: {_0}")]
    NoMatchingVariant(#[error(not(source))] String),
    /// The upstream source says the post does not exist (404-equivalent).
    #[display("post not found upstream")]
    UpstreamNotFound,
    /// Any other failure talking to the upstream source.
    #[display("upstream request failed")]
    Upstream,
    /// The upstream source did not answer in time.
    #[display("upstream request timed out")]
    Timeout,
    /// The upstream answered, but the document is missing a field we rely on.
    #[display("malformed upstream response: missing or invalid {_0}")]
    MalformedResponse(#[error(not(source))] &'static str),
    /// The provider is registered but intentionally not implemented.
    #[display("{_0} is not supported")]
    Unsupported(#[error(not(source))] String),
    /// The delegated extraction tool is not available on this system.
    #[display("extraction tool not found: {_0}")]
    ToolNotFound(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in the pipeline retries automatically; this only informs logs
    /// and callers that want to decide for themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream | Self::Timeout)
    }

    /// Map a `reqwest` failure onto the taxonomy: timeouts are kept distinct,
    /// a 404 status is "not found", everything else is a generic upstream error.
    pub(crate) fn from_http(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            Self::UpstreamNotFound
        } else {
            Self::Upstream
        }
    }
}
