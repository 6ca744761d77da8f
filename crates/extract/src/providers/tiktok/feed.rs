use exn::OptionExt;
use serde::Deserialize;

use crate::error::{ErrorKind, Result};
use crate::models::{Common, Dimensions, Image, Metadata, Video};

use super::{ACCENT_COLOR, NAME};

#[derive(Debug, Deserialize)]
pub(super) struct Feed {
    #[serde(default)]
    aweme_list: Vec<Aweme>,
}

#[derive(Debug, Deserialize)]
struct Aweme {
    aweme_id: String,
    #[serde(default)]
    desc: String,
    author: Author,
    #[serde(default)]
    video: Option<AwemeVideo>,
    #[serde(default)]
    image_post_info: Option<ImagePostInfo>,
}

#[derive(Debug, Deserialize)]
struct Author {
    nickname: String,
    unique_id: String,
}

#[derive(Debug, Deserialize)]
struct AwemeVideo {
    play_addr: Address,
    #[serde(default)]
    cover: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct ImagePostInfo {
    #[serde(default)]
    images: Vec<PostImage>,
}

#[derive(Debug, Deserialize)]
struct PostImage {
    display_image: Address,
}

/// A media resource. The CDN mirrors in `url_list` are ordered by preference
/// of the *app*; the last one is the most broadly reachable.
#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    url_list: Vec<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}
impl Address {
    fn last_url(&self) -> Option<&str> {
        self.url_list.last().map(String::as_str)
    }
}

impl Feed {
    /// The feed endpoint returns *a* feed starting at the requested post; if
    /// the post is gone the first entry is something else entirely.
    pub(super) fn into_metadata(self, aweme_id: &str) -> Result<Metadata> {
        let aweme = self
            .aweme_list
            .into_iter()
            .next()
            .filter(|aweme| aweme.aweme_id == aweme_id)
            .ok_or_raise(|| ErrorKind::UpstreamNotFound)?;

        let common = Common {
            title: NAME.to_string(),
            description: aweme.desc,
            canonical_url: format!("https://tiktok.com/@{}/video/{}", aweme.author.unique_id, aweme.aweme_id),
            author_name: format!("{} [@{}]", aweme.author.nickname, aweme.author.unique_id),
            author_url: format!("https://tiktok.com/@{}", aweme.author.unique_id),
            accent_color: Some(ACCENT_COLOR.to_string()),
        };

        if let Some(image) = aweme.image_post_info.and_then(|info| info.images.into_iter().next()) {
            let address = image.display_image;
            let media_url = address
                .last_url()
                .ok_or_raise(|| ErrorKind::NoMatchingVariant("photo post without image url".to_string()))?;
            let size = Dimensions::new(address.width, address.height)
                .ok_or_raise(|| ErrorKind::NoMatchingVariant("photo post without image size".to_string()))?;
            return Ok(Image { common, media_url: media_url.to_string(), size }.into());
        }

        let video = aweme.video.ok_or_raise(|| ErrorKind::NoMatchingVariant("post has no video".to_string()))?;
        let media_url = video
            .play_addr
            .last_url()
            .ok_or_raise(|| ErrorKind::NoMatchingVariant("video without play address".to_string()))?;
        let size = Dimensions::new(video.play_addr.width, video.play_addr.height)
            .ok_or_raise(|| ErrorKind::NoMatchingVariant("video without size".to_string()))?;
        let thumbnail_url = video
            .cover
            .as_ref()
            .and_then(Address::last_url)
            .ok_or_raise(|| ErrorKind::MalformedResponse("video.cover"))?;
        Ok(Video {
            common,
            media_url: media_url.to_string(),
            size,
            thumbnail_url: thumbnail_url.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed(aweme: serde_json::Value) -> Feed {
        serde_json::from_value(json!({ "status_code": 0, "aweme_list": [aweme] })).unwrap()
    }

    fn author() -> serde_json::Value {
        json!({ "nickname": "Scout", "unique_id": "scout2015" })
    }

    #[test]
    fn test_video_post() {
        let metadata = feed(json!({
            "aweme_id": "6718335390845095173",
            "desc": "Scramble up ur name",
            "author": author(),
            "video": {
                "play_addr": {
                    "url_list": ["https://v16.tiktokcdn.com/a.mp4", "https://v19.tiktokcdn.com/b.mp4"],
                    "width": 576,
                    "height": 1024
                },
                "cover": { "url_list": ["https://p16.tiktokcdn.com/a.jpg", "https://p19.tiktokcdn.com/b.jpg"] }
            }
        }))
        .into_metadata("6718335390845095173")
        .unwrap();

        let Metadata::Video(video) = metadata else { panic!("expected a video") };
        assert_eq!(video.media_url, "https://v19.tiktokcdn.com/b.mp4");
        assert_eq!(video.thumbnail_url, "https://p19.tiktokcdn.com/b.jpg");
        assert_eq!(video.size, Dimensions::new(576, 1024).unwrap());
        assert_eq!(video.common.author_name, "Scout [@scout2015]");
        assert_eq!(video.common.author_url, "https://tiktok.com/@scout2015");
        assert_eq!(video.common.canonical_url, "https://tiktok.com/@scout2015/video/6718335390845095173");
        assert_eq!(video.common.description, "Scramble up ur name");
        assert_eq!(video.common.accent_color.as_deref(), Some("#ff0050"));
    }

    #[test]
    fn test_photo_post() {
        let metadata = feed(json!({
            "aweme_id": "7",
            "author": author(),
            "video": { "play_addr": { "url_list": ["https://v16.tiktokcdn.com/music.mp3"] } },
            "image_post_info": {
                "images": [
                    {
                        "display_image": {
                            "url_list": ["https://p16.tiktokcdn.com/1.jpeg"],
                            "width": 1080,
                            "height": 1440
                        }
                    },
                    {
                        "display_image": {
                            "url_list": ["https://p16.tiktokcdn.com/2.jpeg"],
                            "width": 1080,
                            "height": 1440
                        }
                    }
                ]
            }
        }))
        .into_metadata("7")
        .unwrap();

        let Metadata::Image(image) = metadata else { panic!("expected an image") };
        assert_eq!(image.media_url, "https://p16.tiktokcdn.com/1.jpeg");
        assert_eq!(image.size, Dimensions::new(1080, 1440).unwrap());
        assert_eq!(image.common.description, "");
    }

    #[test]
    fn test_different_first_post_is_not_found() {
        let err = feed(json!({ "aweme_id": "8", "author": author() })).into_metadata("7").unwrap_err();
        assert_eq!(*err, ErrorKind::UpstreamNotFound);
    }

    #[test]
    fn test_empty_feed_is_not_found() {
        let empty: Feed = serde_json::from_value(json!({ "status_code": 0 })).unwrap();
        assert_eq!(*empty.into_metadata("7").unwrap_err(), ErrorKind::UpstreamNotFound);
    }

    #[test]
    fn test_zero_sized_video_is_no_matching_variant() {
        let err = feed(json!({
            "aweme_id": "7",
            "author": author(),
            "video": {
                "play_addr": { "url_list": ["https://v16.tiktokcdn.com/a.mp4"], "width": 0, "height": 0 },
                "cover": { "url_list": ["https://p16.tiktokcdn.com/a.jpg"] }
            }
        }))
        .into_metadata("7")
        .unwrap_err();
        assert!(matches!(*err, ErrorKind::NoMatchingVariant(_)));
    }
}
