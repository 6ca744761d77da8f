//! SQLite cache of resolved embed metadata.
//!
//! A single keyed table: canonical URL → (metadata kind, JSON body, expiry).
//! The kind is stored beside the body and decides how the body is read back,
//! so a value always comes back as the same variant it went in as.
//!
//! The cache is disposable. Deleting the database only costs re-extraction.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::CacheEntry;
pub use crate::repo::Repository;
