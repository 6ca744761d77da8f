//! Request-level orchestration: canonicalize, consult the cache, extract on a
//! miss, and decide between an embed and a redirect.

pub mod agent;
pub mod error;
mod locks;
pub mod oembed;
mod pipeline;

pub use agent::BotClassifier;
pub use oembed::OEmbed;
pub use pipeline::{Dispatcher, Outcome, Resolved, Settings, Source};
