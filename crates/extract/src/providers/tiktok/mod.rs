//! TikTok, straight from the mobile app's feed API.

mod delegated;
mod feed;
mod query;

use async_trait::async_trait;
use exn::ResultExt;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, USER_AGENT};
use std::time::Duration;
use time::UtcDateTime;
use tracing::instrument;

pub use self::delegated::DelegatedTikTok;
use self::feed::Feed;
use crate::CanonicalUrl;
use crate::consts::TIKTOK_VIDEO_URL_REGEX;
use crate::error::{ErrorKind, Result};
use crate::models::Metadata;
use crate::provider::Provider;

pub(crate) const NAME: &str = "TikTok";
pub(crate) const ACCENT_COLOR: &str = "#ff0050";

/// Whether a URL belongs to TikTok at all (including `vm.`/`vt.` short links).
pub(crate) fn is_tiktok(url: &CanonicalUrl) -> bool {
    url.as_url()
        .host_str()
        .is_some_and(|host| host == "tiktok.com" || host.ends_with(".tiktok.com"))
}

/// The numeric post ID from a full post URL.
pub(crate) fn post_id(url: &str) -> Option<&str> {
    TIKTOK_VIDEO_URL_REGEX.captures(url).and_then(|c| c.get(2)).map(|m| m.as_str())
}

pub struct TikTok {
    client: Client,
}
impl TikTok {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Short links only reveal the post ID after following their redirects.
    async fn resolve_id(&self, url: &CanonicalUrl) -> Result<String> {
        if let Some(id) = post_id(url.as_str()) {
            return Ok(id.to_string());
        }
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| exn::Exn::from(ErrorKind::from_http(&e)))?;
        tracing::debug!(from = %url, to = %response.url(), "followed tiktok redirect");
        match post_id(response.url().as_str()) {
            Some(id) => Ok(id.to_string()),
            None => exn::bail!(ErrorKind::UpstreamNotFound),
        }
    }

    async fn fetch_feed(&self, aweme_id: &str) -> Result<Feed> {
        for install_id in query::install_ids() {
            let response = self
                .client
                .get(query::FEED_URL)
                .query(&query::feed_query(aweme_id, install_id))
                .header(USER_AGENT, query::user_agent())
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| exn::Exn::from(ErrorKind::from_http(&e)))?;
            let declared_empty = response
                .headers()
                .get(CONTENT_LENGTH)
                .is_some_and(|length| length.as_bytes() == b"0");
            let body = response.bytes().await.or_raise(|| ErrorKind::Upstream)?;
            if declared_empty || body.is_empty() {
                tracing::debug!(install_id, "empty feed response, rotating install id");
                continue;
            }
            return serde_json::from_slice(&body).or_raise(|| ErrorKind::MalformedResponse("aweme_list"));
        }
        tracing::warn!(aweme_id, "every install id returned an empty feed");
        exn::bail!(ErrorKind::Upstream)
    }
}

#[async_trait]
impl Provider for TikTok {
    fn name(&self) -> &str {
        NAME
    }

    fn match_url(&self, url: &CanonicalUrl) -> bool {
        is_tiktok(url)
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn extract(&self, url: &CanonicalUrl) -> Result<Metadata> {
        let aweme_id = self.resolve_id(url).await?;
        self.fetch_feed(&aweme_id).await?.into_metadata(&aweme_id)
    }

    /// CDN links are signed and stop working at their `x-expires` timestamp.
    fn ttl(&self, metadata: &Metadata) -> Option<Duration> {
        let media_url = match metadata {
            Metadata::Video(video) => &video.media_url,
            Metadata::Image(image) => &image.media_url,
            Metadata::Text(_) => return None,
        };
        signed_url_ttl(media_url, UtcDateTime::now())
    }
}

fn signed_url_ttl(media_url: &str, now: UtcDateTime) -> Option<Duration> {
    let url = url::Url::parse(media_url).ok()?;
    let expires: i64 = url
        .query_pairs()
        .find(|(key, _)| key == "x-expires")
        .and_then(|(_, value)| value.parse().ok())?;
    // Already expired: keep the entry for no time at all.
    Some(Duration::from_secs(u64::try_from(expires - now.unix_timestamp()).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use crate::models::{Common, Dimensions, Video};

    #[rstest]
    #[case("https://www.tiktok.com/@scout2015/video/6718335390845095173", Some("6718335390845095173"))]
    #[case("https://tiktok.com/@a.b_c/photo/7?is_from_webapp=1", Some("7"))]
    #[case("https://vm.tiktok.com/ZMabcdef/", None)]
    #[case("https://www.tiktok.com/@scout2015", None)]
    fn test_post_id(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(post_id(url), expected);
    }

    #[rstest]
    #[case("https://www.tiktok.com/@scout2015/video/1", true)]
    #[case("https://vm.tiktok.com/ZMabcdef/", true)]
    #[case("https://tiktok.com/@scout2015/video/1", true)]
    #[case("https://nottiktok.com/@scout2015/video/1", false)]
    #[case("https://twitter.com/jack/status/20", false)]
    fn test_match_url(#[case] url: &str, #[case] expected: bool) {
        let tiktok = TikTok::new(Client::new());
        assert_eq!(tiktok.match_url(&CanonicalUrl::parse(url).unwrap()), expected);
    }

    #[rstest]
    #[case("https://v16.tiktokcdn.com/a.mp4?x-expires=1700003600&x-signature=abc", Some(3600))]
    #[case("https://v16.tiktokcdn.com/a.mp4?x-expires=1699990000", Some(0))]
    #[case("https://v16.tiktokcdn.com/a.mp4?x-expires=1000", Some(0))]
    #[case("https://v16.tiktokcdn.com/a.mp4", None)]
    #[case("https://v16.tiktokcdn.com/a.mp4?x-expires=soon", None)]
    fn test_signed_url_ttl(#[case] url: &str, #[case] expected: Option<u64>) {
        let now = UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(signed_url_ttl(url, now), expected.map(Duration::from_secs));
    }

    #[test]
    fn test_ttl_of_expired_video_is_zero() {
        let video = Metadata::from(Video {
            common: Common {
                title: NAME.to_string(),
                description: String::new(),
                canonical_url: "https://tiktok.com/@scout2015/video/1".to_string(),
                author_name: "Scout [@scout2015]".to_string(),
                author_url: "https://tiktok.com/@scout2015".to_string(),
                accent_color: None,
            },
            media_url: "https://v16.tiktokcdn.com/a.mp4?x-expires=1000".to_string(),
            size: Dimensions::new(576, 1024).unwrap(),
            thumbnail_url: "https://p16.tiktokcdn.com/a.jpg".to_string(),
        });
        assert_eq!(TikTok::new(Client::new()).ttl(&video), Some(Duration::ZERO));
    }
}
