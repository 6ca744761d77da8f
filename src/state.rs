//! Application state shared across all request handlers.

use exn::ResultExt;
use std::sync::Arc;
use time::UtcDateTime;
use url::Url;

use crate::error::{ErrorKind, Result};
use embedit_cache::{Database, Repository};
use embedit_config::{Config, TikTokStrategy};
use embedit_dispatch::{BotClassifier, Dispatcher, Resolved, Settings, oembed};
use embedit_extract::Registry;
use embedit_extract::providers::{self, Options, TwitterOptions, ytdlp::YtDlp};
use embedit_render::Renderer;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub renderer: Arc<Renderer>,
    /// Where `/` sends people.
    pub repo: Arc<str>,
    oembed_base: Arc<Url>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, renderer: Renderer, config: &Config) -> Result<Self> {
        let base = format!("{}/ograph/", config.url.trim_end_matches('/'));
        let oembed_base = Url::parse(&base).or_raise(|| ErrorKind::Config)?;
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            renderer: Arc::new(renderer),
            repo: Arc::from(config.repo.as_str()),
            oembed_base: Arc::new(oembed_base),
        })
    }

    /// Open the cache, build the providers and compile the template.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = Database::connect(&config.sqlite.file).await.or_raise(|| ErrorKind::Cache)?;
        let cache = Repository::from(&db);
        match cache.count_expired(UtcDateTime::now()).await {
            Ok(expired) => tracing::info!(expired, path = %config.sqlite.file.display(), "opened cache"),
            Err(err) => tracing::warn!(error = ?err, "could not count expired cache entries"),
        }
        let dispatcher = dispatcher(config, registry(config)?, cache);
        let renderer = Renderer::new().or_raise(|| ErrorKind::Render)?.with_default_color(config.color.clone());
        Self::new(dispatcher, renderer, config)
    }

    /// Link to the oEmbed record for a resolved post. The author name travels
    /// along base64-encoded, so the record can be built from the cache alone.
    pub fn oembed_href(&self, resolved: &Resolved) -> String {
        let mut href = Url::clone(&self.oembed_base);
        href.query_pairs_mut()
            .append_pair("author_name", &oembed::encode_author(&resolved.metadata.common().author_name))
            .append_pair("url", resolved.url.as_str());
        href.into()
    }
}

pub fn dispatcher(config: &Config, registry: Registry, cache: Repository) -> Dispatcher {
    let settings = Settings {
        ttl: config.cache_ttl(),
        extract_timeout: config.extract_timeout(),
        name: config.name.clone(),
        homepage: config.repo.clone(),
    };
    Dispatcher::new(Arc::new(registry), cache, BotClassifier::new(&config.bots.extra), settings)
}

/// Providers in their fixed registration order, with TikTok using the
/// configured strategy.
pub fn registry(config: &Config) -> Result<Registry> {
    let tiktok = match config.providers.tiktok.strategy {
        TikTokStrategy::Api => providers::TikTokStrategy::Api,
        TikTokStrategy::Ytdlp => {
            let policy = config.providers.tiktok.format_policy().or_raise(|| ErrorKind::Config)?;
            let ytdlp = YtDlp::discover(config.ytdlp.binary.clone()).or_raise(|| ErrorKind::Providers)?;
            providers::TikTokStrategy::Delegated { extractor: Arc::new(ytdlp), policy }
        },
    };
    let options = Options {
        timeout: config.extract_timeout(),
        twitter: TwitterOptions {
            bearer_token: config.providers.twitter.bearer_token.clone(),
            session_ttl: config.session_ttl(),
        },
        tiktok,
    };
    providers::registry(options).or_raise(|| ErrorKind::Providers)
}
