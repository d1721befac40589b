//! Cache key types and derivation.
//!
//! A [`CacheKey`] is a 128-bit digest of a request's URL and header set.
//! [`KeyDeriver`] builds it:
//!
//! 1. every header value becomes one `name:value` string
//!    (a header with two values yields two strings),
//! 2. the strings are optionally sorted (see [`HeaderOrder`]),
//! 3. they are joined with `;` and appended to the URL,
//! 4. the resulting bytes are hashed with SHA-256 and truncated to 16 bytes.
//!
//! ```
//! use revalbox_core::KeyDeriver;
//!
//! let request = http::Request::get("https://example.com/logo.png")
//!     .header("accept", "image/png")
//!     .body(())
//!     .unwrap();
//!
//! let key = KeyDeriver::default().derive(&request);
//! assert_eq!(key.to_string().len(), 32);
//! ```

use std::fmt;

use http::{HeaderMap, Request, Uri};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const HEADER_SEPARATOR: u8 = b';';
const NAME_VALUE_SEPARATOR: u8 = b':';

/// Identifier of a cached entry.
///
/// Keys are plain 16-byte values: `Copy`, hashable, and rendered as 32
/// lowercase hex characters by [`Display`](fmt::Display). The hex form is
/// what out-of-process stores use as their storage key, so two processes
/// deriving the same key share cache entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; CacheKey::LEN]);

impl CacheKey {
    /// Size of a key in bytes.
    pub const LEN: usize = 16;

    /// Wraps raw digest bytes.
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        CacheKey(bytes)
    }

    /// Returns the raw digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self)
    }
}

/// How header strings are ordered before hashing.
///
/// Two requests carrying the same headers but built in a different order
/// produce the same key under [`Sorted`](HeaderOrder::Sorted) and, in
/// general, different keys under [`InsertionOrder`](HeaderOrder::InsertionOrder).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderOrder {
    /// Sort `name:value` strings byte-wise before joining.
    #[default]
    Sorted,
    /// Join `name:value` strings in the order the header map yields them.
    InsertionOrder,
}

/// Computes [`CacheKey`]s from requests.
///
/// The deriver holds no state besides its [`HeaderOrder`], so it is `Copy`
/// and can be shared freely between tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyDeriver {
    order: HeaderOrder,
}

impl KeyDeriver {
    /// Creates a deriver with the given header ordering.
    pub const fn new(order: HeaderOrder) -> Self {
        KeyDeriver { order }
    }

    /// Returns the header ordering used by this deriver.
    pub fn order(&self) -> HeaderOrder {
        self.order
    }

    /// Derives the key of a request. The body is ignored.
    pub fn derive<B>(&self, request: &Request<B>) -> CacheKey {
        self.derive_from(request.uri(), request.headers())
    }

    /// Derives a key from a URI and a header map.
    pub fn derive_from(&self, uri: &Uri, headers: &HeaderMap) -> CacheKey {
        let mut lines: Vec<Vec<u8>> = headers
            .iter()
            .map(|(name, value)| {
                let mut line = Vec::with_capacity(name.as_str().len() + 1 + value.len());
                line.extend_from_slice(name.as_str().as_bytes());
                line.push(NAME_VALUE_SEPARATOR);
                line.extend_from_slice(value.as_bytes());
                line
            })
            .collect();

        if self.order == HeaderOrder::Sorted {
            lines.sort_unstable();
        }

        let mut hasher = Sha256::new();
        hasher.update(uri.to_string().as_bytes());
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                hasher.update([HEADER_SEPARATOR]);
            }
            hasher.update(line);
        }

        let digest = hasher.finalize();
        let mut key = [0u8; CacheKey::LEN];
        key.copy_from_slice(&digest[..CacheKey::LEN]);
        CacheKey(key)
    }
}
