//! Canonical URL normalization.
//!
//! The canonical form is both the cache key and the input handed to
//! providers, so two spellings of the same post must end up identical.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use exn::ResultExt;
use url::Url;

use crate::error::{Error, ErrorKind, Result};

/// A normalized `http(s)` URL.
///
/// # Examples
///
/// ```
/// use embedit_extract::CanonicalUrl;
///
/// let url: CanonicalUrl = "/https:/X.com/jack/status/20?utm_source=share#top".parse().unwrap();
/// assert_eq!(url.as_str(), "https://x.com/jack/status/20");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Normalize a raw URL as received in a request path.
    ///
    /// - leading slashes (left over from the request path) are trimmed,
    /// - `https:/host` (a double slash collapsed by a proxy) is restored,
    /// - a missing scheme defaults to `https://`, any scheme other than
    ///   `http`/`https` is rejected,
    /// - the fragment and any `utm_*` tracking parameters are removed.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref().trim().trim_start_matches('/');
        if raw.is_empty() {
            exn::bail!(ErrorKind::InvalidUrl(raw.to_string()));
        }
        let restored = match raw.split_once(':') {
            Some((scheme, rest)) if matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") => {
                format!("{}://{}", scheme.to_ascii_lowercase(), rest.trim_start_matches('/'))
            },
            Some((_, rest)) if rest.starts_with('/') => exn::bail!(ErrorKind::InvalidUrl(raw.to_string())),
            _ => format!("https://{raw}"),
        };
        let mut url = Url::parse(&restored).or_raise(|| ErrorKind::InvalidUrl(raw.to_string()))?;
        if url.host_str().is_none_or(str::is_empty) {
            exn::bail!(ErrorKind::InvalidUrl(raw.to_string()));
        }
        url.set_fragment(None);
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !key.starts_with("utm_"))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}
impl FromStr for CanonicalUrl {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}
impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
impl Display for CanonicalUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://twitter.com/jack/status/20", "https://twitter.com/jack/status/20")]
    #[case("/https://twitter.com/jack/status/20", "https://twitter.com/jack/status/20")]
    #[case("https:/twitter.com/jack/status/20", "https://twitter.com/jack/status/20")]
    #[case("HTTPS://Twitter.COM/jack/status/20", "https://twitter.com/jack/status/20")]
    #[case("twitter.com/jack/status/20", "https://twitter.com/jack/status/20")]
    #[case("https://x.com/jack/status/20#reply", "https://x.com/jack/status/20")]
    #[case("https://x.com/jack/status/20?utm_source=a&utm_medium=b", "https://x.com/jack/status/20")]
    #[case("https://x.com/jack/status/20?s=20&utm_source=a", "https://x.com/jack/status/20?s=20")]
    #[case("http://www.tiktok.com/@scout/video/1", "http://www.tiktok.com/@scout/video/1")]
    fn test_normalization(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(CanonicalUrl::parse(raw).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case("https://")]
    #[case("http:///")]
    #[case("https://exa mple.com/")]
    fn test_invalid(#[case] raw: &str) {
        let err = CanonicalUrl::parse(raw).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidUrl(_)));
    }

    #[test]
    fn test_other_schemes_are_rejected() {
        assert!(CanonicalUrl::parse("ftp://example.com/a").is_err());
        assert!(CanonicalUrl::parse("javascript://alert(1)").is_err());
        // A port is not a scheme.
        assert_eq!(CanonicalUrl::parse("localhost:8080/a").unwrap().as_str(), "https://localhost:8080/a");
    }
}
