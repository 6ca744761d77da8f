use serde::{Deserialize, Serialize};

use super::{Dimensions, Kind};

/// Fields shared by every embeddable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Common {
    pub title: String,
    pub description: String,
    /// Where humans get redirected to, and what the embed links back to.
    pub canonical_url: String,
    pub author_name: String,
    pub author_url: String,
    /// CSS hex colour (`#rrggbb`) used for the embed accent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

/// A post without any media attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPost {
    #[serde(flatten)]
    pub common: Common,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(flatten)]
    pub common: Common,
    pub media_url: String,
    #[serde(flatten)]
    pub size: Dimensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    #[serde(flatten)]
    pub common: Common,
    pub media_url: String,
    #[serde(flatten)]
    pub size: Dimensions,
    pub thumbnail_url: String,
}

/// Normalized Open Graph metadata for a resolved post.
///
/// Exactly one variant per value. The variant is *not* part of the serialized
/// body (see [`Metadata::to_json`]); it is carried separately as a [`Kind`] so
/// that the two are never inferred from each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    Text(TextPost),
    Image(Image),
    Video(Video),
}
impl Metadata {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Text(_) => Kind::Text,
            Self::Image(_) => Kind::Image,
            Self::Video(_) => Kind::Video,
        }
    }

    pub fn common(&self) -> &Common {
        match self {
            Self::Text(post) => &post.common,
            Self::Image(image) => &image.common,
            Self::Video(video) => &video.common,
        }
    }

    pub fn canonical_url(&self) -> &str {
        &self.common().canonical_url
    }

    pub fn title(&self) -> &str {
        &self.common().title
    }

    /// Serialize the variant body (without its tag).
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Text(post) => serde_json::to_string(post),
            Self::Image(image) => serde_json::to_string(image),
            Self::Video(video) => serde_json::to_string(video),
        }
    }

    /// Deserialize a variant body according to an explicit tag.
    pub fn from_json(kind: Kind, json: &str) -> serde_json::Result<Self> {
        Ok(match kind {
            Kind::Text => Self::Text(serde_json::from_str(json)?),
            Kind::Image => Self::Image(serde_json::from_str(json)?),
            Kind::Video => Self::Video(serde_json::from_str(json)?),
        })
    }
}
impl From<TextPost> for Metadata {
    fn from(post: TextPost) -> Self {
        Self::Text(post)
    }
}
impl From<Image> for Metadata {
    fn from(image: Image) -> Self {
        Self::Image(image)
    }
}
impl From<Video> for Metadata {
    fn from(video: Video) -> Self {
        Self::Video(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(accent_color: Option<&str>) -> Common {
        Common {
            title: "Twitter".to_string(),
            description: "hello <world>".to_string(),
            canonical_url: "https://twitter.com/jack/status/20".to_string(),
            author_name: "jack (@jack)".to_string(),
            author_url: "https://twitter.com/jack".to_string(),
            accent_color: accent_color.map(str::to_string),
        }
    }

    #[test]
    fn test_kind_follows_variant() {
        let text = Metadata::from(TextPost { common: common(None), author_avatar: None });
        assert_eq!(text.kind(), Kind::Text);
        assert_eq!(text.canonical_url(), "https://twitter.com/jack/status/20");
    }

    #[test]
    fn test_body_is_flat_and_untagged() {
        let video = Metadata::from(Video {
            common: common(Some("#1DA1F2")),
            media_url: "https://video.twimg.com/vid/720x1280/a.mp4".to_string(),
            size: Dimensions::new(720, 1280).unwrap(),
            thumbnail_url: "https://pbs.twimg.com/a.jpg".to_string(),
        });
        let value: serde_json::Value = serde_json::from_str(&video.to_json().unwrap()).unwrap();
        assert_eq!(value["width"], 720);
        assert_eq!(value["height"], 1280);
        assert_eq!(value["accent_color"], "#1DA1F2");
        assert!(value.get("kind").is_none());
        assert!(value.get("type").is_none());
    }

    #[test]
    fn test_optional_fields_absent() {
        let text = Metadata::from(TextPost { common: common(None), author_avatar: None });
        let json = text.to_json().unwrap();
        assert!(!json.contains("accent_color"));
        assert!(!json.contains("author_avatar"));
        assert_eq!(Metadata::from_json(Kind::Text, &json).unwrap(), text);
    }

    #[test]
    fn test_explicit_tag_decides_variant() {
        // An image body has every field a text post needs; the tag still wins.
        let image = Metadata::from(Image {
            common: common(None),
            media_url: "https://pbs.twimg.com/media/a.jpg".to_string(),
            size: Dimensions::new(1200, 800).unwrap(),
        });
        let json = image.to_json().unwrap();
        assert_eq!(Metadata::from_json(Kind::Image, &json).unwrap(), image);
        assert_eq!(Metadata::from_json(Kind::Text, &json).unwrap().kind(), Kind::Text);
        assert!(Metadata::from_json(Kind::Video, &json).is_err());
    }
}
