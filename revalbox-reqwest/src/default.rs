//! Process-wide default client.

use bytes::Bytes;
use lazy_static::lazy_static;
use revalbox::{CacheError, CachedResponse, CachingClient};

use crate::transport::ReqwestTransport;

lazy_static! {
    static ref DEFAULT_CLIENT: CachingClient<ReqwestTransport> =
        CachingClient::new(ReqwestTransport::default());
}

/// Returns the process-wide client used by [`fetch_with_cache`] and
/// [`fetch_request_with_cache`].
///
/// It is created on first use with `reqwest::Client::new()` and an empty
/// [`MemoryStore`](revalbox::store::MemoryStore), and lives for the rest of
/// the process. Code that needs isolation (tests, multiple tenants) should
/// build its own [`CachingClient`] instead.
pub fn default_client() -> &'static CachingClient<ReqwestTransport> {
    &DEFAULT_CLIENT
}

/// Fetches `url` through the default client.
pub async fn fetch_with_cache(url: &str) -> Result<CachedResponse, CacheError<reqwest::Error>> {
    default_client().fetch_with_cache(url).await
}

/// Sends `request` through the default client.
pub async fn fetch_request_with_cache(
    request: http::Request<Bytes>,
) -> Result<CachedResponse, CacheError<reqwest::Error>> {
    default_client().fetch_request_with_cache(request).await
}
