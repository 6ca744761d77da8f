//! HTML embed documents for link-preview crawlers.
//!
//! [`meta_tags`] turns a post's metadata into an ordered list of Open Graph
//! tags; [`Renderer`] writes them into the embedded `embed.html` template.

pub mod error;
mod tags;

use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use tracing::instrument;
use upon::{Engine, Template};

use crate::error::{ErrorKind, Result};
use embedit_extract::models::Metadata;
pub use crate::tags::{Attribute, MetaTag, meta_tags};

const EMBED_TEMPLATE: &str = "embed.html";

#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

/// Compiled embed template.
///
/// Built once at startup and shared; rendering takes `&self`. Every value is
/// HTML-escaped by the template engine.
pub struct Renderer {
    engine: Engine<'static>,
    template: Template<'static>,
    default_color: Option<String>,
}
impl Renderer {
    pub fn new() -> Result<Self> {
        let source = Templates::get(EMBED_TEMPLATE)
            .ok_or_raise(|| ErrorKind::AssetNotFound(EMBED_TEMPLATE.to_string()))?
            .data;
        let source = String::from_utf8(source.into_owned()).or_raise(|| ErrorKind::Template)?;
        let engine = Engine::new();
        // Compile up front so a broken template fails at startup.
        let template = engine.compile(source).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template, default_color: None })
    }

    /// Accent colour for posts whose provider doesn't set one.
    pub fn with_default_color(mut self, color: impl Into<Option<String>>) -> Self {
        self.default_color = color.into();
        self
    }

    #[instrument(skip_all, fields(kind = %metadata.kind()))]
    pub fn render(&self, metadata: &Metadata, oembed_href: &str) -> Result<String> {
        let tags: Vec<upon::Value> = tags::tags(metadata, oembed_href, self.default_color.as_deref())
            .iter()
            .map(MetaTag::to_value)
            .collect();
        self.template
            .render(&self.engine, upon::value! { tags: tags })
            .to_string()
            .or_raise(|| ErrorKind::Template)
    }
}
