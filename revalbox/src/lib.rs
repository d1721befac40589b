#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # revalbox
//!
//! A caching layer that sits in front of an HTTP client and avoids
//! re-downloading resources the origin says have not changed.
//!
//! For every request the [`CachingClient`]:
//!
//! 1. derives a [`CacheKey`] from the URL and headers,
//! 2. serves the stored body directly if the entry is still **fresh**
//!    (`Cache-Control: max-age` or `Expires`),
//! 3. otherwise attaches `If-None-Match` / `If-Modified-Since` from the
//!    stored **validators** and sends the request through its [`Transport`],
//! 4. on `304 Not Modified` returns the stored body, on anything else stores
//!    the new response if it carries a validator or freshness information.
//!
//! ```no_run
//! # use revalbox::{CachingClient, Transport};
//! # async fn run<T: Transport>(transport: T)
//! # where <T::Body as http_body::Body>::Error: Into<T::Error> {
//! let client = CachingClient::new(transport);
//!
//! let first = client.fetch_with_cache("https://example.com/logo.png").await.unwrap();
//! let second = client.fetch_with_cache("https://example.com/logo.png").await.unwrap();
//! if second.is_cache_hit() {
//!     assert_eq!(first.body, second.body);
//! }
//! # }
//! ```
//!
//! A ready-made transport for `reqwest` and a process-wide default client
//! live in `revalbox-reqwest`.
//!
//! ## Feature Flags
//!
//! - `metrics` - Record hit/miss/revalidation counters through the `metrics` facade

/// Client orchestrating lookups, conditional requests and store updates.
pub mod client;

/// Error types returned to callers.
pub mod error;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters for
/// cache hits, misses, revalidations and swallowed store faults, plus an
/// upstream latency histogram. Otherwise every function is a no-op.
pub mod metrics;

/// Result type combining network and cache responses.
pub mod response;

/// Storage re-exports.
///
/// Re-exports the [`Store`](revalbox_backend::Store) trait and the default
/// [`MemoryStore`](revalbox_backend::MemoryStore) so most users only need
/// this crate.
pub mod store {
    pub use revalbox_backend::{MemoryStore, Store, StoreError, StoreResult, format};
}

/// The request/response capability the client delegates to.
pub mod transport;

pub use client::{CachingClient, CachingClientBuilder, NotSet};
pub use error::CacheError;
pub use response::{CacheStatus, CachedResponse, ResponseStatus};
pub use revalbox_core::{CacheEntry, CacheKey, HeaderOrder, KeyDeriver};
pub use transport::Transport;
