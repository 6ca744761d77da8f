//! The oEmbed record some consumers fetch alongside the meta tags.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use serde::Serialize;

/// Fixed-shape oEmbed `link` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OEmbed {
    pub author_name: String,
    pub author_url: String,
    pub provider_name: String,
    pub provider_url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub version: &'static str,
}

/// Encode an author name for the `author_name` query parameter of an oEmbed
/// link. Base64 keeps arbitrary display names intact through URL handling.
pub fn encode_author(author_name: &str) -> String {
    URL_SAFE_NO_PAD.encode(author_name)
}

/// Decode an `author_name` token. Tokens minted elsewhere may use either
/// alphabet, with or without padding. `None` if it isn't base64 of UTF-8.
pub fn decode_author(token: &str) -> Option<String> {
    let token = token.trim();
    [URL_SAFE_NO_PAD, URL_SAFE, STANDARD_NO_PAD, STANDARD]
        .iter()
        .find_map(|engine| engine.decode(token).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .filter(|name| !name.is_empty())
}
