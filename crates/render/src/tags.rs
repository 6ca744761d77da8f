//! The flat list of Open Graph tags describing one post.

use embedit_extract::models::{Dimensions, Metadata};

/// How a tag names its key in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// `<meta property="og:…">`
    Property,
    /// `<meta name="…">`
    Name,
    /// `<link rel="…">`, only used for the oEmbed discovery link.
    Link,
}
impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Name => "name",
            Self::Link => "rel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    pub attribute: Attribute,
    pub key: &'static str,
    pub value: String,
}
impl MetaTag {
    fn property(key: &'static str, value: impl ToString) -> Self {
        Self { attribute: Attribute::Property, key, value: value.to_string() }
    }

    fn name(key: &'static str, value: impl ToString) -> Self {
        Self { attribute: Attribute::Name, key, value: value.to_string() }
    }

    pub(crate) fn to_value(&self) -> upon::Value {
        upon::value! {
            link: self.attribute == Attribute::Link,
            attribute: self.attribute.as_str(),
            key: self.key,
            value: self.value.as_str(),
        }
    }
}

/// Meta tags for `metadata`, in document order, ending with the oEmbed link.
///
/// Values are raw text; escaping is left to whatever writes them out.
pub fn meta_tags(metadata: &Metadata, oembed_href: &str) -> Vec<MetaTag> {
    tags(metadata, oembed_href, None)
}

pub(crate) fn tags(metadata: &Metadata, oembed_href: &str, fallback_color: Option<&str>) -> Vec<MetaTag> {
    let common = metadata.common();
    let mut tags = vec![
        MetaTag::property("og:title", &common.title),
        MetaTag::property("og:description", &common.description),
        MetaTag::property("og:url", &common.canonical_url),
        MetaTag::property("og:site_name", &common.author_name),
    ];
    if let Some(color) = common.accent_color.as_deref().or(fallback_color) {
        tags.push(MetaTag::name("theme-color", color));
    }
    match metadata {
        Metadata::Text(post) => {
            tags.push(MetaTag::name("twitter:card", "summary"));
            if let Some(avatar) = &post.author_avatar {
                tags.push(MetaTag::property("og:image", avatar));
            }
        },
        Metadata::Image(image) => {
            tags.push(MetaTag::name("twitter:card", "summary_large_image"));
            tags.push(MetaTag::property("og:image", &image.media_url));
            push_size(&mut tags, "og:image:width", "og:image:height", image.size);
        },
        Metadata::Video(video) => {
            tags.push(MetaTag::name("twitter:card", "summary_large_image"));
            tags.push(MetaTag::property("og:video", &video.media_url));
            tags.push(MetaTag::property("og:video:secure_url", &video.media_url));
            tags.push(MetaTag::property("og:video:type", "video/mp4"));
            push_size(&mut tags, "og:video:width", "og:video:height", video.size);
            tags.push(MetaTag::property("og:image", &video.thumbnail_url));
        },
    }
    tags.push(MetaTag { attribute: Attribute::Link, key: "alternate", value: oembed_href.to_string() });
    tags
}

fn push_size(tags: &mut Vec<MetaTag>, width: &'static str, height: &'static str, size: Dimensions) {
    tags.push(MetaTag::property(width, size.width));
    tags.push(MetaTag::property(height, size.height));
}
