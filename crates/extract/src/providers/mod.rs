//! The built-in providers, and the registration order they ship in.

mod instagram;
mod tiktok;
mod twitter;
pub mod ytdlp;

use std::sync::Arc;
use std::time::Duration;

pub use self::instagram::Instagram;
pub use self::tiktok::{DelegatedTikTok, TikTok};
pub use self::twitter::{DEFAULT_BEARER_TOKEN, DEFAULT_SESSION_TTL, Twitter, TwitterOptions};
use self::ytdlp::{FormatPolicy, InfoExtractor};
use crate::error::{ErrorKind, Result};
use crate::registry::Registry;
use exn::ResultExt;

/// How TikTok posts get extracted.
#[derive(Clone)]
pub enum TikTokStrategy {
    /// Query the mobile app's feed API directly.
    Api,
    /// Hand the URL to a generic extractor and pick a format by policy.
    Delegated {
        extractor: Arc<dyn InfoExtractor>,
        policy: FormatPolicy,
    },
}

#[derive(Clone)]
pub struct Options {
    /// Per-request timeout of the shared HTTP client.
    pub timeout: Duration,
    pub twitter: TwitterOptions,
    pub tiktok: TikTokStrategy,
}
impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            twitter: TwitterOptions::default(),
            tiktok: TikTokStrategy::Api,
        }
    }
}

/// Build the standard registry. Order: Twitter, TikTok, Instagram. Their URL
/// spaces are disjoint, but should that ever change the earlier one wins.
pub fn registry(options: Options) -> Result<Registry> {
    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .or_raise(|| ErrorKind::Upstream)?;

    let mut registry = Registry::new();
    registry.register(Twitter::new(client.clone(), options.twitter));
    match options.tiktok {
        TikTokStrategy::Api => registry.register(TikTok::new(client)),
        TikTokStrategy::Delegated { extractor, policy } => registry.register(DelegatedTikTok::new(extractor, policy)),
    };
    registry.register(Instagram);
    Ok(registry)
}
