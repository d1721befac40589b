//! Caching client.
//!
//! [`CachingClient`] owns a [`Transport`], a [`Store`] and a [`KeyDeriver`]
//! and runs the lookup / conditional request / store protocol for each call.

use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::{HeaderValue, Request, StatusCode, Uri};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use revalbox_backend::{MemoryStore, Store};
use revalbox_core::{CacheEntry, CacheKey, KeyDeriver};
use tracing::{debug, trace, warn};

use crate::error::CacheError;
use crate::metrics;
use crate::response::{CacheStatus, CachedResponse};
use crate::transport::Transport;

/// HTTP client wrapper that caches responses by validator and freshness.
///
/// The client is stateless besides its store, so it can be shared between
/// tasks behind a reference or an `Arc`. Calls for different keys never
/// block each other beyond what the store does internally.
///
/// Two concurrent calls for the same key may both reach the origin and both
/// save; the last write wins.
#[derive(Debug, Clone)]
pub struct CachingClient<T, S = MemoryStore> {
    transport: T,
    store: S,
    keys: KeyDeriver,
}

impl<T> CachingClient<T> {
    /// Creates a client with a fresh [`MemoryStore`] and sorted-header keys.
    pub fn new(transport: T) -> Self {
        CachingClient::with_store(transport, MemoryStore::new())
    }
}

impl<T, S> CachingClient<T, S> {
    /// Creates a client backed by an explicit store.
    pub fn with_store(transport: T, store: S) -> Self {
        CachingClient {
            transport,
            store,
            keys: KeyDeriver::default(),
        }
    }

    /// Returns the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the key deriver.
    pub fn key_deriver(&self) -> &KeyDeriver {
        &self.keys
    }
}

impl CachingClient<NotSet, MemoryStore> {
    /// Creates a new [`CachingClientBuilder`].
    ///
    /// Only the transport is mandatory. The store defaults to a new
    /// [`MemoryStore`] and keys default to [`KeyDeriver::default`].
    pub fn builder() -> CachingClientBuilder<NotSet, MemoryStore> {
        CachingClientBuilder {
            transport: NotSet,
            store: MemoryStore::new(),
            keys: KeyDeriver::default(),
        }
    }
}

impl<T, S> CachingClient<T, S>
where
    T: Transport,
    S: Store,
    <T::Body as HttpBody>::Error: Into<T::Error>,
{
    /// Fetches `url` with a plain `GET`, consulting the cache first.
    ///
    /// The URL must be absolute. Parse failures are reported as
    /// [`CacheError::InvalidRequest`] before the store or the network is
    /// touched.
    pub async fn fetch_with_cache(
        &self,
        url: &str,
    ) -> Result<CachedResponse, CacheError<T::Error>> {
        let request = Request::get(url).body(Bytes::new())?;
        self.fetch_request_with_cache(request).await
    }

    /// Sends a caller-built request, consulting the cache first.
    ///
    /// The key covers the URL and every header the caller set, but not the
    /// method or the body.
    pub async fn fetch_request_with_cache(
        &self,
        mut request: Request<Bytes>,
    ) -> Result<CachedResponse, CacheError<T::Error>> {
        ensure_absolute(request.uri())?;

        let key = self.keys.derive(&request);
        let cached = self.lookup(&key).await;

        if let Some(entry) = cached.as_ref().filter(|entry| entry.is_fresh(Utc::now())) {
            debug!(?key, "Serving fresh entry from cache");
            metrics::record_cache_status(CacheStatus::Hit, self.store.name());
            return Ok(CachedResponse::hit(entry.body().clone()));
        }

        if let Some(entry) = &cached {
            add_conditional_headers(&mut request, entry);
        }

        let started = Instant::now();
        let response = self
            .transport
            .send(request)
            .await
            .map_err(CacheError::Transport)?;
        let (parts, body) = response.into_parts();

        if parts.status == StatusCode::NOT_MODIFIED {
            if let Some(entry) = cached.filter(CacheEntry::has_validator) {
                debug!(?key, "Origin confirmed cached entry");
                metrics::record_upstream_duration(started.elapsed(), CacheStatus::Revalidated);
                metrics::record_cache_status(CacheStatus::Revalidated, self.store.name());
                return Ok(CachedResponse::network(
                    parts.status,
                    parts.headers,
                    entry.into_body(),
                    CacheStatus::Revalidated,
                ));
            }
            warn!(?key, "Got 304 Not Modified without a cached entry");
        }

        let body = body
            .collect()
            .await
            .map_err(|error| CacheError::Transport(error.into()))?
            .to_bytes();
        metrics::record_upstream_duration(started.elapsed(), CacheStatus::Miss);
        metrics::record_cache_status(CacheStatus::Miss, self.store.name());

        if parts.status != StatusCode::NOT_MODIFIED {
            match CacheEntry::from_response(&parts.headers, body.clone(), Utc::now()) {
                Some(entry) => self.save(&key, entry).await,
                None => debug!(?key, status = %parts.status, "Response has no validator or freshness, not cached"),
            }
        }

        Ok(CachedResponse::network(
            parts.status,
            parts.headers,
            body,
            CacheStatus::Miss,
        ))
    }

    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Ok(entry) => {
                trace!(?key, found = entry.is_some(), "Store lookup");
                entry
            }
            Err(error) => {
                warn!(?key, store = self.store.name(), %error, "Store read failed, treating as miss");
                metrics::record_store_read_error(self.store.name());
                None
            }
        }
    }

    async fn save(&self, key: &CacheKey, entry: CacheEntry) {
        trace!(
            ?key,
            etag = ?entry.etag(),
            last_modified = ?entry.last_modified(),
            expires_at = ?entry.expires_at(),
            "Saving entry"
        );
        if let Err(error) = self.store.save(key, entry).await {
            warn!(?key, store = self.store.name(), %error, "Store write failed");
            metrics::record_store_write_error(self.store.name());
        }
    }
}

fn ensure_absolute<E>(uri: &Uri) -> Result<(), CacheError<E>> {
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(CacheError::RelativeUrl(uri.to_string()));
    }
    Ok(())
}

fn add_conditional_headers(request: &mut Request<Bytes>, entry: &CacheEntry) {
    let validators = [
        (IF_NONE_MATCH, entry.etag()),
        (IF_MODIFIED_SINCE, entry.last_modified()),
    ];
    for (name, value) in validators {
        let Some(value) = value else { continue };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                request.headers_mut().insert(name, value);
            }
            Err(_) => warn!(header = %name, "Stored validator is not a valid header value"),
        }
    }
}

/// Builder for [`CachingClient`].
///
/// Use [`CachingClient::builder()`] to create a new builder.
pub struct CachingClientBuilder<T, S> {
    transport: T,
    store: S,
    keys: KeyDeriver,
}

/// Marker type for unset builder fields.
///
/// When you see `NotSet` in a compiler error, it means you haven't called
/// [`CachingClientBuilder::transport`] yet.
#[derive(Debug, Clone, Copy)]
pub struct NotSet;

impl<T, S> CachingClientBuilder<T, S> {
    /// Sets the transport used to reach the origin.
    pub fn transport<NewT>(self, transport: NewT) -> CachingClientBuilder<NewT, S> {
        CachingClientBuilder {
            transport,
            store: self.store,
            keys: self.keys,
        }
    }

    /// Sets the store entries are kept in.
    pub fn store<NewS>(self, store: NewS) -> CachingClientBuilder<T, NewS> {
        CachingClientBuilder {
            transport: self.transport,
            store,
            keys: self.keys,
        }
    }

    /// Sets how cache keys are derived from requests.
    pub fn key_deriver(mut self, keys: KeyDeriver) -> Self {
        self.keys = keys;
        self
    }
}

impl<T, S> CachingClientBuilder<T, S>
where
    T: Transport,
    S: Store,
{
    /// Builds the client.
    pub fn build(self) -> CachingClient<T, S> {
        CachingClient {
            transport: self.transport,
            store: self.store,
            keys: self.keys,
        }
    }
}
