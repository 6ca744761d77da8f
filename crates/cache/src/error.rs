//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A row is tagged with a metadata kind this build doesn't know. The row
    /// is left alone; it gets replaced the next time the URL is extracted.
    #[display("unknown metadata kind in cache: {_0}")]
    UnknownKind(#[error(not(source))] String),
    /// Serialization/deserialization error.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // SQLITE_BUSY and friends surface as a plain database error.
        matches!(self, Self::Database)
    }

    /// The stored data cannot be trusted, as opposed to the store being
    /// unavailable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::UnknownKind(_) | Self::InvalidData(_))
    }
}
