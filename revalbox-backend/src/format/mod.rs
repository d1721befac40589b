//! Serialization of cache entries for out-of-process stores.
//!
//! | Format | Crate | Notes |
//! |--------|-------|-------|
//! | [`JsonFormat`] | `serde_json` | Default, human-readable |
//! | [`BincodeFormat`] | `bincode` | Compact binary |
//!
//! No wire format is mandated: any store only has to read back what it wrote.

use revalbox_core::{CacheEntry, Raw};
use thiserror::Error;

mod bincode;
mod json;

pub use bincode::BincodeFormat;
pub use json::JsonFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Converts entries to bytes and back.
pub trait Format: std::fmt::Debug + Send + Sync {
    /// Serializes an entry.
    fn serialize(&self, entry: &CacheEntry) -> Result<Raw, FormatError>;

    /// Deserializes an entry previously produced by [`serialize`](Format::serialize).
    fn deserialize(&self, data: &[u8]) -> Result<CacheEntry, FormatError>;
}

impl<F> Format for std::sync::Arc<F>
where
    F: Format + ?Sized,
{
    fn serialize(&self, entry: &CacheEntry) -> Result<Raw, FormatError> {
        (**self).serialize(entry)
    }

    fn deserialize(&self, data: &[u8]) -> Result<CacheEntry, FormatError> {
        (**self).deserialize(data)
    }
}
