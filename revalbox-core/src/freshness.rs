//! Reading validator and freshness headers off a response.
//!
//! Freshness comes from two headers, in priority order:
//!
//! 1. `Cache-Control: max-age=N`: fresh until `now + N` seconds. `max-age=0`
//!    counts as absent.
//! 2. `Expires: <HTTP-date>`: fresh until that instant. The values `""`,
//!    `"-1"` and `"0"` explicitly mean "already expired" and set nothing;
//!    unparsable dates are ignored.
//!
//! Validators (`ETag`, `Last-Modified`) are copied verbatim and never parsed.

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use http::HeaderMap;
use http::header::{CACHE_CONTROL, ETAG, EXPIRES, LAST_MODIFIED};

use crate::entry::CacheEntry;

const MAX_AGE: &str = "max-age";

/// `Expires` values that mean "not cacheable" rather than a date.
pub const NOT_CACHEABLE_EXPIRES: [&str; 3] = ["", "-1", "0"];

/// Interpretation of a single `Expires` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiresHeader {
    /// One of the [`NOT_CACHEABLE_EXPIRES`] sentinels.
    NotCacheable,
    /// A valid HTTP-date.
    At(DateTime<Utc>),
    /// Anything else. Treated as if the header were absent.
    Invalid,
}

impl ExpiresHeader {
    /// Classifies an `Expires` header value.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if NOT_CACHEABLE_EXPIRES.contains(&value) {
            return ExpiresHeader::NotCacheable;
        }
        match httpdate::parse_http_date(value) {
            Ok(time) => ExpiresHeader::At(DateTime::<Utc>::from(time)),
            Err(_) => ExpiresHeader::Invalid,
        }
    }

    /// Returns the instant, if this is a valid date.
    pub fn instant(self) -> Option<DateTime<Utc>> {
        match self {
            ExpiresHeader::At(time) => Some(time),
            _ => None,
        }
    }
}

/// Extracts the `max-age` directive, in seconds, from a `Cache-Control` value.
///
/// Directive names are case-insensitive and the value may be quoted.
/// Returns `None` when the directive is missing, unparsable or zero.
///
/// ```
/// use revalbox_core::freshness::max_age;
///
/// assert_eq!(max_age("public, max-age=86400, public"), Some(86400));
/// assert_eq!(max_age("max-age=0"), None);
/// assert_eq!(max_age("no-store"), None);
/// ```
pub fn max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(MAX_AGE))
        .and_then(|(_, value)| value.trim().trim_matches('"').parse::<u64>().ok())
        .filter(|seconds| *seconds > 0)
}

/// Validators and expiry read from one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Freshness {
    /// `ETag` header value.
    pub etag: Option<String>,
    /// `Last-Modified` header value.
    pub last_modified: Option<String>,
    /// Absolute expiry computed from `max-age` or `Expires`.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Freshness {
    /// Reads validators and computes the expiry instant relative to `now`.
    pub fn from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Self {
        let max_age_seconds = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(max_age);

        let expires_at = match max_age_seconds {
            Some(seconds) => i64::try_from(seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|age| now.checked_add_signed(age)),
            None => header_str(headers, EXPIRES)
                .and_then(|value| ExpiresHeader::parse(value).instant()),
        };

        Freshness {
            etag: header_str(headers, ETAG).map(str::to_owned),
            last_modified: header_str(headers, LAST_MODIFIED).map(str::to_owned),
            expires_at,
        }
    }

    /// True iff an `ETag` or `Last-Modified` value is present.
    pub fn has_validator(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }

    /// Turns the headers into a storable entry.
    ///
    /// Returns `None` if the entry would carry neither a validator nor an
    /// expiry in the future of `now`.
    pub fn into_entry(self, body: Bytes, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = CacheEntry::new(body, self.etag, self.last_modified, self.expires_at);
        let storable = entry.has_validator() || entry.is_fresh(now);
        storable.then_some(entry)
    }
}

fn header_str(headers: &HeaderMap, name: http::header::HeaderName) -> Option<&str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
