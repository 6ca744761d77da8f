use derive_more::{Display, Error};
use exn::OptionExt;
use serde::Deserialize;
use std::str::FromStr;

use crate::error::{ErrorKind, Result};
use crate::models::Dimensions;

/// The subset of `yt-dlp --dump-single-json` output we normalize.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader_url: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<Format>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}
impl Format {
    /// A format can be embedded only if it has a URL and a positive size.
    fn usable(&self) -> Option<(&str, Dimensions)> {
        let url = self.url.as_deref().filter(|url| !url.is_empty())?;
        Some((url, Dimensions::new(self.width?, self.height?)?))
    }
}

/// How to choose one format out of the list `yt-dlp` offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Display)]
pub enum FormatPolicy {
    /// First usable format, in upstream order.
    #[default]
    #[display("first")]
    First,
    /// Exactly this format ID; anything else is an error.
    #[display("exact:{_0}")]
    Exact(String),
    /// This format ID if it is usable, else [`First`](Self::First).
    #[display("prefer:{_0}")]
    Prefer(String),
}

#[derive(Debug, Display, Error)]
#[display("unknown format policy: {_0} (expected first, exact:<id> or prefer:<id>)")]
pub struct UnknownFormatPolicy(#[error(not(source))] pub String);

impl FromStr for FormatPolicy {
    type Err = UnknownFormatPolicy;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "first" => Ok(Self::First),
            Some(("exact", id)) if !id.is_empty() => Ok(Self::Exact(id.to_string())),
            Some(("prefer", id)) if !id.is_empty() => Ok(Self::Prefer(id.to_string())),
            _ => Err(UnknownFormatPolicy(s.to_string())),
        }
    }
}

impl FormatPolicy {
    /// Returns the chosen format's URL and size.
    pub fn select<'a>(&self, formats: &'a [Format]) -> Result<(&'a str, Dimensions)> {
        let by_id = |id: &str| formats.iter().filter(|f| f.format_id == id).find_map(Format::usable);
        let first = || formats.iter().find_map(Format::usable);
        match self {
            Self::First => first().ok_or_raise(|| ErrorKind::NoMatchingVariant("no usable format".to_string())),
            Self::Exact(id) => {
                by_id(id.as_str()).ok_or_raise(|| ErrorKind::NoMatchingVariant(format!("format {id} not offered")))
            },
            Self::Prefer(id) => by_id(id.as_str())
                .or_else(first)
                .ok_or_raise(|| ErrorKind::NoMatchingVariant("no usable format".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn format(id: &str, url: Option<&str>, size: Option<(u32, u32)>) -> Format {
        Format {
            format_id: id.to_string(),
            url: url.map(str::to_string),
            width: size.map(|(w, _)| w),
            height: size.map(|(_, h)| h),
        }
    }

    fn formats() -> Vec<Format> {
        vec![
            format("audio", Some("https://cdn/audio.m4a"), None),
            format("download", Some("https://cdn/download.mp4"), Some((576, 1024))),
            format("h264_540p", Some("https://cdn/540.mp4"), Some((540, 960))),
            format("bytevc1_720p", None, Some((720, 1280))),
        ]
    }

    #[rstest]
    #[case("first", FormatPolicy::First)]
    #[case("exact:h264_540p", FormatPolicy::Exact("h264_540p".to_string()))]
    #[case("prefer:download", FormatPolicy::Prefer("download".to_string()))]
    fn test_parse(#[case] input: &str, #[case] expected: FormatPolicy) {
        assert_eq!(input.parse::<FormatPolicy>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("best")]
    #[case("exact:")]
    #[case("first:h264")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(input.parse::<FormatPolicy>().is_err());
    }

    #[test]
    fn test_first_skips_unusable() {
        let formats = formats();
        let (url, size) = FormatPolicy::First.select(&formats).unwrap();
        assert_eq!(url, "https://cdn/download.mp4");
        assert_eq!(size, Dimensions::new(576, 1024).unwrap());
    }

    #[test]
    fn test_exact() {
        let formats = formats();
        let (url, _) = FormatPolicy::Exact("h264_540p".to_string()).select(&formats).unwrap();
        assert_eq!(url, "https://cdn/540.mp4");
        // Offered, but without a URL.
        let err = FormatPolicy::Exact("bytevc1_720p".to_string()).select(&formats).unwrap_err();
        assert!(matches!(*err, ErrorKind::NoMatchingVariant(_)));
    }

    #[test]
    fn test_prefer_falls_back_to_first() {
        let formats = formats();
        let prefer = |id: &str| FormatPolicy::Prefer(id.to_string());
        assert_eq!(prefer("h264_540p").select(&formats).unwrap().0, "https://cdn/540.mp4");
        assert_eq!(prefer("missing").select(&formats).unwrap().0, "https://cdn/download.mp4");
    }

    #[test]
    fn test_nothing_usable() {
        let formats = vec![format("audio", Some("https://cdn/audio.m4a"), None)];
        for policy in [FormatPolicy::First, FormatPolicy::Prefer("audio".to_string())] {
            assert!(matches!(*policy.select(&formats).unwrap_err(), ErrorKind::NoMatchingVariant(_)));
        }
    }
}
