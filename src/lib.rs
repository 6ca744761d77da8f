//! embedit: Open Graph embeds for social media posts.
//!
//! Link-preview crawlers asking for `/<post url>` get an HTML document of
//! Open Graph tags describing the post; people get redirected to the post.
//! Resolved posts are cached in SQLite, and an oEmbed endpoint serves the
//! author details some chat clients fetch separately.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
