use async_trait::async_trait;

use crate::CanonicalUrl;
use crate::error::{ErrorKind, Result};
use crate::models::Metadata;
use crate::provider::Provider;

const NAME: &str = "Instagram";

/// Claims Instagram links so they fail with a stable error instead of falling
/// through as unknown. No extraction strategy works against it currently.
pub struct Instagram;

#[async_trait]
impl Provider for Instagram {
    fn name(&self) -> &str {
        NAME
    }

    fn match_url(&self, url: &CanonicalUrl) -> bool {
        url.as_url()
            .host_str()
            .is_some_and(|host| host == "instagram.com" || host.ends_with(".instagram.com"))
    }

    async fn extract(&self, _url: &CanonicalUrl) -> Result<Metadata> {
        exn::bail!(ErrorKind::Unsupported(NAME.to_string()))
    }
}
