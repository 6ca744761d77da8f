//! Twitter/X, via the guest GraphQL API.

use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

use crate::CanonicalUrl;
use crate::consts::{SIZE_REGEX, TWEET_URL_REGEX};
use crate::error::{ErrorKind, Result};
use crate::models::{Common, Dimensions, Image, Metadata, TextPost, Video};
use crate::provider::Provider;
use crate::session::{SessionCache, SessionFactory};

const NAME: &str = "Twitter";
const ACCENT_COLOR: &str = "#1DA1F2";
const ACTIVATE_URL: &str = "https://api.twitter.com/1.1/guest/activate.json";
const TWEET_RESULT_URL: &str = "https://api.twitter.com/graphql/0hWvDhmW8YQ-S_ib3azIrw/TweetResultByRestId";

/// The bearer token baked into the public web client.
pub const DEFAULT_BEARER_TOKEN: &str =
    "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";
/// Guest sessions are invalidated upstream after three hours.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 150);

#[derive(Debug, Clone)]
pub struct TwitterOptions {
    pub bearer_token: String,
    pub session_ttl: Duration,
}
impl Default for TwitterOptions {
    fn default() -> Self {
        Self {
            bearer_token: DEFAULT_BEARER_TOKEN.to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

struct GuestToken(String);

struct GuestActivation {
    client: Client,
    bearer: String,
}

#[async_trait]
impl SessionFactory for GuestActivation {
    type Session = GuestToken;

    async fn create(&self) -> Result<GuestToken> {
        #[derive(Deserialize)]
        struct Activated {
            guest_token: String,
        }

        let activated: Activated = self
            .client
            .post(ACTIVATE_URL)
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .or_raise(|| ErrorKind::Upstream)?
            .json()
            .await
            .or_raise(|| ErrorKind::MalformedResponse("guest_token"))?;
        Ok(GuestToken(activated.guest_token))
    }
}

pub struct Twitter {
    client: Client,
    bearer: String,
    guest: SessionCache<GuestActivation>,
}
impl Twitter {
    pub fn new(client: Client, options: TwitterOptions) -> Self {
        let factory = GuestActivation {
            client: client.clone(),
            bearer: options.bearer_token.clone(),
        };
        Self {
            client,
            bearer: options.bearer_token,
            guest: SessionCache::new(factory, options.session_ttl),
        }
    }

    async fn fetch(&self, tweet_id: &str) -> Result<TweetResponse> {
        let guest = self.guest.get().await?;
        let variables = json!({
            "tweetId": tweet_id,
            "withCommunity": false,
            "includePromotedContent": false,
            "withVoice": false,
        });
        let features = json!({
            "creator_subscriptions_tweet_preview_api_enabled": true,
            "tweetypie_unmention_optimization_enabled": true,
            "responsive_web_edit_tweet_api_enabled": true,
            "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
            "view_counts_everywhere_api_enabled": true,
            "longform_notetweets_consumption_enabled": true,
            "responsive_web_twitter_article_tweet_consumption_enabled": false,
            "tweet_awards_web_tipping_enabled": false,
            "freedom_of_speech_not_reach_fetch_enabled": true,
            "standardized_nudges_misinfo": true,
            "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
            "longform_notetweets_rich_text_read_enabled": true,
            "longform_notetweets_inline_media_enabled": true,
            "responsive_web_graphql_exclude_directive_enabled": true,
            "verified_phone_label_enabled": false,
            "responsive_web_media_download_video_enabled": false,
            "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
            "responsive_web_graphql_timeline_navigation_enabled": true,
            "responsive_web_enhance_cards_enabled": false,
        });
        let response = self
            .client
            .get(TWEET_RESULT_URL)
            .query(&[("variables", variables.to_string()), ("features", features.to_string())])
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer))
            .header("x-guest-token", &guest.0)
            .send()
            .await
            .map_err(|e| exn::Exn::from(ErrorKind::from_http(&e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                // The guest token was revoked early. Don't retry this request;
                // the next one starts a fresh session.
                tracing::warn!(status = %response.status(), "guest session rejected");
                self.guest.invalidate().await;
                exn::bail!(ErrorKind::Upstream);
            },
            StatusCode::NOT_FOUND => exn::bail!(ErrorKind::UpstreamNotFound),
            status if !status.is_success() => {
                tracing::warn!(%status, "unexpected status from tweet lookup");
                exn::bail!(ErrorKind::Upstream);
            },
            _ => {},
        }
        response.json().await.or_raise(|| ErrorKind::MalformedResponse("tweetResult"))
    }
}

#[async_trait]
impl Provider for Twitter {
    fn name(&self) -> &str {
        NAME
    }

    fn match_url(&self, url: &CanonicalUrl) -> bool {
        TWEET_URL_REGEX.is_match(url.as_str())
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn extract(&self, url: &CanonicalUrl) -> Result<Metadata> {
        let tweet_id = TWEET_URL_REGEX
            .captures(url.as_str())
            .and_then(|captures| captures.get(2))
            .ok_or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?
            .as_str();
        let tweet = self.fetch(tweet_id).await?.into_tweet()?;
        tweet.into_metadata()
    }
}

// Only the handful of fields we read out of the (very large) GraphQL document.

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}
impl TweetResponse {
    /// A missing or deleted tweet comes back as an empty `tweetResult` object.
    fn into_tweet(self) -> Result<Tweet> {
        match self.data.tweet_result.result {
            Some(TweetUnion::Tweet(tweet)) | Some(TweetUnion::TweetWithVisibilityResults { tweet }) => Ok(tweet),
            Some(TweetUnion::Unavailable) | None => exn::bail!(ErrorKind::UpstreamNotFound),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TweetData {
    #[serde(rename = "tweetResult", default)]
    tweet_result: TweetResult,
}

#[derive(Debug, Default, Deserialize)]
struct TweetResult {
    #[serde(default)]
    result: Option<TweetUnion>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum TweetUnion {
    Tweet(Tweet),
    TweetWithVisibilityResults {
        tweet: Tweet,
    },
    #[serde(other)]
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    rest_id: String,
    core: TweetCore,
    legacy: TweetLegacy,
}

#[derive(Debug, Deserialize)]
struct TweetCore {
    user_results: UserResults,
}

#[derive(Debug, Deserialize)]
struct UserResults {
    result: UserResult,
}

#[derive(Debug, Deserialize)]
struct UserResult {
    legacy: UserLegacy,
}

#[derive(Debug, Deserialize)]
struct UserLegacy {
    name: String,
    screen_name: String,
    #[serde(default)]
    profile_image_url_https: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TweetLegacy {
    full_text: String,
    #[serde(default)]
    entities: Entities,
    #[serde(default)]
    extended_entities: Option<Entities>,
}

#[derive(Debug, Default, Deserialize)]
struct Entities {
    #[serde(default)]
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(rename = "type")]
    kind: MediaKind,
    media_url_https: String,
    #[serde(default)]
    sizes: HashMap<String, MediaSize>,
    #[serde(default)]
    video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
}

#[derive(Debug, Deserialize)]
struct MediaSize {
    w: u32,
    h: u32,
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    variants: Vec<VideoVariant>,
}

#[derive(Debug, Deserialize)]
struct VideoVariant {
    content_type: String,
    url: String,
}

impl Tweet {
    fn into_metadata(self) -> Result<Metadata> {
        let user = self.core.user_results.result.legacy;
        let common = Common {
            title: NAME.to_string(),
            description: self.legacy.full_text,
            canonical_url: format!("https://twitter.com/{}/status/{}", user.screen_name, self.rest_id),
            author_name: format!("{} (@{})", user.name, user.screen_name),
            author_url: format!("https://twitter.com/{}", user.screen_name),
            accent_color: Some(ACCENT_COLOR.to_string()),
        };
        // `extended_entities` carries every attachment, `entities` only the first.
        let media = self
            .legacy
            .extended_entities
            .and_then(|entities| entities.media.into_iter().next())
            .or_else(|| self.legacy.entities.media.into_iter().next());

        let Some(media) = media else {
            return Ok(TextPost { common, author_avatar: user.profile_image_url_https }.into());
        };
        match media.kind {
            MediaKind::Photo => {
                let size = media
                    .sizes
                    .values()
                    .filter_map(|size| Dimensions::new(size.w, size.h))
                    .max_by_key(Dimensions::area)
                    .ok_or_raise(|| ErrorKind::NoMatchingVariant("photo has no usable size".to_string()))?;
                Ok(Image { common, media_url: media.media_url_https, size }.into())
            },
            MediaKind::Video | MediaKind::AnimatedGif => {
                let variants = media.video_info.map(|info| info.variants).unwrap_or_default();
                let (variant, size) = best_video_variant(&variants)
                    .ok_or_raise(|| ErrorKind::NoMatchingVariant("no sized video/mp4 variant".to_string()))?;
                Ok(Video {
                    common,
                    media_url: variant.url.clone(),
                    size,
                    thumbnail_url: media.media_url_https,
                }
                .into())
            },
        }
    }
}

/// Pick the highest resolution `video/mp4` variant, reading its size from the
/// `WxH` segment in its URL. Variants without one are skipped; on equal area
/// the earlier variant wins.
fn best_video_variant(variants: &[VideoVariant]) -> Option<(&VideoVariant, Dimensions)> {
    variants
        .iter()
        .filter(|variant| variant.content_type == "video/mp4")
        .filter_map(|variant| {
            let captures = SIZE_REGEX.captures(&variant.url)?;
            let width: u32 = captures.get(1)?.as_str().parse().ok()?;
            let height: u32 = captures.get(2)?.as_str().parse().ok()?;
            Some((variant, Dimensions::new(width, height)?))
        })
        .fold(None, |best: Option<(&VideoVariant, Dimensions)>, candidate| match best {
            Some(current) if current.1.area() >= candidate.1.area() => Some(current),
            _ => Some(candidate),
        })
}
