//! The provider seam: one implementation per content source.

use async_trait::async_trait;
use std::time::Duration;

use crate::CanonicalUrl;
use crate::error::Result;
use crate::models::Metadata;

/// A pluggable handler for one content source.
///
/// Providers are constructed once at startup, registered into a
/// [`Registry`](crate::Registry) and never mutated afterwards, so every method
/// takes `&self`. Any state that does change over time (e.g. an upstream
/// session) is owned by the provider and synchronised internally.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use embedit_extract::error::{ErrorKind, Result};
/// use embedit_extract::{CanonicalUrl, Provider, models::Metadata};
///
/// struct Example;
///
/// #[async_trait]
/// impl Provider for Example {
///     fn name(&self) -> &str {
///         "Example"
///     }
///
///     fn match_url(&self, url: &CanonicalUrl) -> bool {
///         url.as_url().host_str() == Some("example.com")
///     }
///
///     async fn extract(&self, url: &CanonicalUrl) -> Result<Metadata> {
///         exn::bail!(ErrorKind::Unsupported(self.name().to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Display name, also used as the routing identifier in logs. Unique
    /// within a registry.
    fn name(&self) -> &str;

    /// Whether this provider claims the URL. Must be cheap and pure: it is
    /// called for every registered provider on every cache miss.
    fn match_url(&self, url: &CanonicalUrl) -> bool;

    /// Turn the URL into normalized metadata, talking to the upstream source.
    ///
    /// Implementations should map failures onto
    /// [`NoMatchingVariant`](crate::error::ErrorKind::NoMatchingVariant),
    /// [`UpstreamNotFound`](crate::error::ErrorKind::UpstreamNotFound) or
    /// [`Upstream`](crate::error::ErrorKind::Upstream) so the pipeline can tell
    /// them apart.
    async fn extract(&self, url: &CanonicalUrl) -> Result<Metadata>;

    /// How long an extraction result may be cached for. `None` defers to the
    /// configured default.
    fn ttl(&self, _metadata: &Metadata) -> Option<Duration> {
        None
    }
}
