use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use derive_more::{Display as DeriveDisplay, Error};

/// The persisted discriminant of a [`Metadata`](super::Metadata) value.
///
/// Stored next to the serialized body so that deserialization never has to
/// guess the variant from the shape of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Text-only post (no media).
    Text,
    /// A single still image.
    Image,
    /// A video with a thumbnail.
    Video,
}
impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Text => "text",
            Kind::Image => "image",
            Kind::Video => "video",
        }
    }
}

/// A stored discriminant that doesn't name any known [`Kind`].
#[derive(Debug, DeriveDisplay, Error, Clone, PartialEq, Eq)]
#[display("unknown metadata kind: {_0}")]
pub struct UnknownKind(#[error(not(source))] pub String);

impl FromStr for Kind {
    type Err = UnknownKind;
    // Deliberately strict: tags are written by us, so anything else is corruption.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "text" => Self::Text,
            "image" => Self::Image,
            "video" => Self::Video,
            _ => return Err(UnknownKind(s.to_string())),
        })
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Kind::Text, "text")]
    #[case(Kind::Image, "image")]
    #[case(Kind::Video, "video")]
    fn test_kind_strings(#[case] kind: Kind, #[case] tag: &str) {
        assert_eq!(kind.as_str(), tag);
        assert_eq!(tag.parse::<Kind>().unwrap(), kind);
    }

    #[rstest]
    #[case("")]
    #[case("Video")]
    #[case("gif")]
    #[case(" text")]
    fn test_unknown_kind(#[case] tag: &str) {
        assert_eq!(tag.parse::<Kind>(), Err(UnknownKind(tag.to_string())));
    }
}
