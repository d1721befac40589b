//! Cached response model.
//!
//! A [`CacheEntry`] is what a store keeps per [`CacheKey`](crate::CacheKey):
//! the response body plus everything needed to decide how it may be reused.
//!
//! ## Validators vs freshness
//!
//! - **Validators** (`ETag`, `Last-Modified`) let the client ask the origin
//!   "is my copy still current?" with a conditional request.
//! - **Freshness** (`expires_at`) lets the client skip the origin entirely
//!   until the instant passes.
//!
//! An entry always has at least one of the two; [`CacheEntry::from_response`]
//! refuses to build one otherwise.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::freshness::Freshness;

/// A cached response body with its validators and expiry instant.
///
/// ```
/// use bytes::Bytes;
/// use chrono::{Duration, Utc};
/// use revalbox_core::CacheEntry;
///
/// let now = Utc::now();
/// let entry = CacheEntry::new(Bytes::from_static(b"hello"), None, None, Some(now + Duration::seconds(10)));
///
/// assert!(entry.is_fresh(now));
/// assert!(!entry.has_validator());
/// assert!(entry.is_invalidatable(now + Duration::seconds(11)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    body: Bytes,
    #[serde(default)]
    etag: Option<String>,
    #[serde(default)]
    last_modified: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Creates an entry from its parts.
    ///
    /// Empty validator strings are normalized to `None`.
    pub fn new(
        body: Bytes,
        etag: Option<String>,
        last_modified: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        CacheEntry {
            body,
            etag: etag.filter(|v| !v.is_empty()),
            last_modified: last_modified.filter(|v| !v.is_empty()),
            expires_at,
        }
    }

    /// Builds an entry for a response, or `None` if the response must not be stored.
    ///
    /// A response is not stored when it carries no validator and no usable
    /// expiry. An expiry that has already passed at `now` counts as unusable
    /// for a validator-less response, since the entry would be garbage the
    /// moment it is written.
    pub fn from_response(headers: &HeaderMap, body: Bytes, now: DateTime<Utc>) -> Option<Self> {
        Freshness::from_headers(headers, now).into_entry(body, now)
    }

    /// Returns the cached body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the `ETag` validator, verbatim as the origin sent it.
    #[inline]
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Returns the `Last-Modified` validator, verbatim as the origin sent it.
    #[inline]
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Returns the instant after which the entry is no longer fresh.
    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Consumes the entry and returns the body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// True iff an expiry is set and `now` is before it.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now < expires_at)
    }

    /// True iff the entry carries an `ETag` or a `Last-Modified` value.
    pub fn has_validator(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }

    /// True iff the entry can no longer be used in any way: no validator,
    /// and an expiry that is not in the future.
    ///
    /// Stores may delete such entries on sight.
    pub fn is_invalidatable(&self, now: DateTime<Utc>) -> bool {
        !self.has_validator() && self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Time left until the entry stops being fresh, if it is fresh at `now`.
    pub fn time_to_live(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        self.expires_at
            .and_then(|expires_at| (expires_at - now).to_std().ok())
            .filter(|ttl| !ttl.is_zero())
    }
}
