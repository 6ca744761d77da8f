//! Ordered, static set of providers.

use std::sync::Arc;

use crate::CanonicalUrl;
use crate::provider::Provider;

/// The providers known to this process, in registration order.
///
/// Built once at startup and read-only afterwards; share it behind an [`Arc`]
/// without any locking. Lookups scan providers in the order they were
/// registered and the **first** match wins, so if two providers ever claim
/// overlapping URL spaces the earlier registration takes precedence.
#[derive(Clone, Default)]
pub struct Registry {
    providers: Vec<Arc<dyn Provider>>,
}
impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider. Registration order is significant, see [`Registry`].
    pub fn register(&mut self, provider: impl Provider + 'static) -> &mut Self {
        self.register_arc(Arc::new(provider))
    }

    pub fn register_arc(&mut self, provider: Arc<dyn Provider>) -> &mut Self {
        if self.providers.iter().any(|p| p.name() == provider.name()) {
            tracing::warn!(provider = provider.name(), "provider name registered more than once");
        }
        tracing::info!(provider = provider.name(), position = self.providers.len(), "registered provider");
        self.providers.push(provider);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, provider: impl Provider + 'static) -> Self {
        self.register(provider);
        self
    }

    /// Returns the first registered provider whose predicate accepts `url`,
    /// or `None` if nothing claims it (not an error; the caller decides).
    pub fn find_provider(&self, url: &CanonicalUrl) -> Option<Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.match_url(url)).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Result};
    use crate::models::Metadata;
    use async_trait::async_trait;

    struct HostProvider {
        name: &'static str,
        host: &'static str,
    }

    #[async_trait]
    impl Provider for HostProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn match_url(&self, url: &CanonicalUrl) -> bool {
            url.as_url().host_str().is_some_and(|h| h.ends_with(self.host))
        }

        async fn extract(&self, _url: &CanonicalUrl) -> Result<Metadata> {
            exn::bail!(ErrorKind::Unsupported(self.name.to_string()))
        }
    }

    fn url(s: &str) -> CanonicalUrl {
        CanonicalUrl::parse(s).unwrap()
    }

    #[test]
    fn test_no_match_is_none() {
        let registry = Registry::new().with(HostProvider { name: "Twitter", host: "twitter.com" });
        assert!(registry.find_provider(&url("https://example.com/a")).is_none());
        assert!(Registry::new().find_provider(&url("https://twitter.com/a")).is_none());
    }

    #[test]
    fn test_first_registered_wins_on_overlap() {
        let registry = Registry::new()
            .with(HostProvider { name: "Specific", host: "video.example.com" })
            .with(HostProvider { name: "Generic", host: "example.com" });
        assert_eq!(registry.find_provider(&url("https://video.example.com/1")).unwrap().name(), "Specific");
        assert_eq!(registry.find_provider(&url("https://www.example.com/1")).unwrap().name(), "Generic");

        // Same providers, opposite order: the generic one now shadows the specific one.
        let registry = Registry::new()
            .with(HostProvider { name: "Generic", host: "example.com" })
            .with(HostProvider { name: "Specific", host: "video.example.com" });
        assert_eq!(registry.find_provider(&url("https://video.example.com/1")).unwrap().name(), "Generic");
    }

    #[test]
    fn test_names_in_registration_order() {
        let mut registry = Registry::new();
        registry
            .register(HostProvider { name: "A", host: "a.com" })
            .register(HostProvider { name: "B", host: "b.com" });
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(registry.len(), 2);
    }
}
