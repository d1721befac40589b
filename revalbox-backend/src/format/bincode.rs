use ::bincode::config::{Configuration, standard};
use bytes::Bytes;
use revalbox_core::{CacheEntry, Raw};

use super::{Format, FormatError};

const CONFIG: Configuration = standard();

/// Bincode format, using bincode's serde compatibility layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn serialize(&self, entry: &CacheEntry) -> Result<Raw, FormatError> {
        ::bincode::serde::encode_to_vec(entry, CONFIG)
            .map(Bytes::from)
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<CacheEntry, FormatError> {
        ::bincode::serde::decode_from_slice(data, CONFIG)
            .map(|(entry, _)| entry)
            .map_err(|err| FormatError::Deserialize(Box::new(err)))
    }
}
