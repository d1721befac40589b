#![warn(missing_docs)]
//! # revalbox-core
//!
//! Core types for the revalbox HTTP response cache.
//!
//! This crate is protocol-aware but I/O-free. It knows how to:
//!
//! - **Identify** a request with a fixed-size [`CacheKey`] ([`KeyDeriver`])
//! - **Model** a stored response with its validators and expiry ([`CacheEntry`])
//! - **Read** freshness and validator headers off a response ([`freshness`])
//!
//! Storage lives in `revalbox-backend` and the request/response decision
//! protocol lives in `revalbox`. Everything here is a pure function of its
//! inputs, including the current time, which is always passed in explicitly.

pub mod entry;
pub mod freshness;
pub mod key;

pub use entry::CacheEntry;
pub use freshness::{ExpiresHeader, Freshness};
pub use key::{CacheKey, HeaderOrder, KeyDeriver};

/// Raw byte data type used for cached bodies and serialized entries.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
