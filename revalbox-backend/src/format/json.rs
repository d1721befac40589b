use bytes::Bytes;
use revalbox_core::{CacheEntry, Raw};

use super::{Format, FormatError};

/// JSON format (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn serialize(&self, entry: &CacheEntry) -> Result<Raw, FormatError> {
        serde_json::to_vec(entry)
            .map(Bytes::from)
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<CacheEntry, FormatError> {
        serde_json::from_slice(data).map_err(|err| FormatError::Deserialize(Box::new(err)))
    }
}
