//! Response types returned by the caching client.
//!
//! Every call yields a [`CachedResponse`] with the same shape, whether the
//! body came from the store or from the network:
//!
//! | Path | `status` | `headers` | `cache` |
//! |------|----------|-----------|---------|
//! | Fresh entry served | [`ResponseStatus::Cached`] | empty | [`CacheStatus::Hit`] |
//! | `304` on a conditional request | `Network(304)` | origin's | [`CacheStatus::Revalidated`] |
//! | Anything else | `Network(status)` | origin's | [`CacheStatus::Miss`] |

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// Where the status of a [`CachedResponse`] came from.
///
/// Cache hits carry a dedicated marker instead of a made-up `200`, so they
/// can always be told apart from real network responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Served from the store without contacting the origin.
    Cached,
    /// Status of the network response.
    Network(StatusCode),
}

impl ResponseStatus {
    /// Numeric stand-in for [`ResponseStatus::Cached`], outside the range of
    /// statuses any origin sends.
    pub const CACHE_CONTENT_CODE: u16 = 999;

    /// Returns the network status code, if any.
    pub fn network(&self) -> Option<StatusCode> {
        match self {
            ResponseStatus::Cached => None,
            ResponseStatus::Network(status) => Some(*status),
        }
    }

    /// Numeric status, with [`CACHE_CONTENT_CODE`](Self::CACHE_CONTENT_CODE)
    /// for cache hits.
    pub fn as_u16(&self) -> u16 {
        match self {
            ResponseStatus::Cached => Self::CACHE_CONTENT_CODE,
            ResponseStatus::Network(status) => status.as_u16(),
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseStatus::Cached => f.write_str("Use Cache"),
            ResponseStatus::Network(status) => {
                f.write_str(status.canonical_reason().unwrap_or(status.as_str()))
            }
        }
    }
}

/// How the cache took part in producing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// A fresh entry was served without a network round trip.
    Hit,
    /// The response came from the network.
    #[default]
    Miss,
    /// The origin confirmed the stored entry with `304 Not Modified`.
    Revalidated,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Revalidated => "revalidated",
        }
    }
}

/// Result of a cached fetch.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Network status or the cache-hit marker.
    pub status: ResponseStatus,
    /// Response headers from the network. Empty for cache hits.
    pub headers: HeaderMap,
    /// Full response body, from the network or from the store.
    pub body: Bytes,
    /// How the cache took part in this response.
    pub cache: CacheStatus,
}

impl CachedResponse {
    pub(crate) fn hit(body: Bytes) -> Self {
        CachedResponse {
            status: ResponseStatus::Cached,
            headers: HeaderMap::new(),
            body,
            cache: CacheStatus::Hit,
        }
    }

    pub(crate) fn network(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        cache: CacheStatus,
    ) -> Self {
        CachedResponse {
            status: ResponseStatus::Network(status),
            headers,
            body,
            cache,
        }
    }

    /// True if the body was served from the store without a network round trip.
    pub fn is_cache_hit(&self) -> bool {
        self.status == ResponseStatus::Cached
    }

    /// Consumes the response and returns the body.
    pub fn into_body(self) -> Bytes {
        self.body
    }
}
