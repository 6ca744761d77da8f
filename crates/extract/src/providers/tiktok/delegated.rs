use async_trait::async_trait;
use exn::OptionExt;
use std::sync::Arc;
use tracing::instrument;

use super::{ACCENT_COLOR, NAME, is_tiktok};
use crate::CanonicalUrl;
use crate::error::{ErrorKind, Result};
use crate::models::{Common, Metadata, Video};
use crate::provider::Provider;
use crate::providers::ytdlp::{FormatPolicy, Info, InfoExtractor};

/// TikTok through a generic [`InfoExtractor`] instead of the app API.
pub struct DelegatedTikTok {
    extractor: Arc<dyn InfoExtractor>,
    policy: FormatPolicy,
}
impl DelegatedTikTok {
    pub fn new(extractor: Arc<dyn InfoExtractor>, policy: FormatPolicy) -> Self {
        Self { extractor, policy }
    }

    fn normalize(&self, url: &CanonicalUrl, info: Info) -> Result<Metadata> {
        let (media_url, size) = self.policy.select(&info.formats)?;
        let thumbnail_url = info.thumbnail.clone().ok_or_raise(|| ErrorKind::MalformedResponse("thumbnail"))?;
        let uploader = info.uploader.clone().unwrap_or_default();
        let channel = info.channel.clone().unwrap_or_else(|| uploader.clone());
        let canonical_url = match info.uploader.as_deref() {
            Some(handle) => format!("https://tiktok.com/@{handle}/video/{}", info.id),
            None => info.webpage_url.clone().unwrap_or_else(|| url.to_string()),
        };
        let common = Common {
            title: NAME.to_string(),
            description: info.description.clone().or(info.title.clone()).unwrap_or_default(),
            author_url: info.uploader_url.clone().unwrap_or_else(|| format!("https://tiktok.com/@{uploader}")),
            author_name: format!("{channel} (@{uploader})"),
            canonical_url,
            accent_color: Some(ACCENT_COLOR.to_string()),
        };
        Ok(Video {
            common,
            media_url: media_url.to_string(),
            size,
            thumbnail_url,
        }
        .into())
    }
}

#[async_trait]
impl Provider for DelegatedTikTok {
    fn name(&self) -> &str {
        NAME
    }

    fn match_url(&self, url: &CanonicalUrl) -> bool {
        is_tiktok(url)
    }

    #[instrument(skip(self), fields(url = %url, policy = %self.policy))]
    async fn extract(&self, url: &CanonicalUrl) -> Result<Metadata> {
        let info = self.extractor.extract_info(url.as_str()).await?;
        self.normalize(url, info)
    }
}
