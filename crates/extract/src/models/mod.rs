mod dimensions;
mod kind;
mod metadata;

pub use self::dimensions::Dimensions;
pub use self::kind::Kind;
pub use self::metadata::{Common, Image, Metadata, TextPost, Video};
