//! Turning social media post URLs into normalized embed metadata.
//!
//! A [`Registry`] holds an ordered list of [`Provider`]s; the first provider
//! that claims a [`CanonicalUrl`] extracts it into a [`models::Metadata`]. The
//! built-in providers live in [`providers`], and [`providers::registry`]
//! assembles them in their standard order.

mod canonical;
mod consts;
pub mod error;
pub mod models;
mod provider;
pub mod providers;
mod registry;
pub mod session;

pub use crate::canonical::CanonicalUrl;
pub use crate::provider::Provider;
pub use crate::registry::Registry;
