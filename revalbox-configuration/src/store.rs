//! Store section of the configuration.

use std::sync::Arc;

use revalbox_backend::Store as StoreTrait;
use revalbox_backend::format::{BincodeFormat, Format, JsonFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings of a Moka store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Moka {
    /// Maximum number of entries.
    pub max_capacity: u64,
}

/// Settings of a Redis store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Redis {
    /// Redis URL, e.g. `redis://127.0.0.1:6379/0`.
    pub connection_string: String,
    /// Entry serialization.
    #[serde(default)]
    pub format: ValueSerialization,
    /// Prefix of every Redis key.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "revalbox:".to_owned()
}

/// Entry serialization for out-of-process stores.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ValueSerialization {
    /// `serde_json`.
    #[default]
    Json,
    /// `bincode`.
    Bincode,
}

impl ValueSerialization {
    /// Returns the matching format.
    pub fn to_serializer(&self) -> Arc<dyn Format> {
        match self {
            ValueSerialization::Json => Arc::new(JsonFormat),
            ValueSerialization::Bincode => Arc::new(BincodeFormat),
        }
    }
}

/// Which store keeps the entries.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Store {
    /// Unbounded in-process map.
    #[default]
    Memory,
    /// Bounded in-process cache. Requires the `moka` feature.
    Moka(Moka),
    /// Shared Redis server. Requires the `redis` feature.
    Redis(Redis),
}

impl Store {
    /// Builds the store.
    pub fn into_store(self) -> Result<Arc<dyn StoreTrait>, ConfigError> {
        match self {
            Store::Memory => Ok(Arc::new(revalbox_backend::MemoryStore::new())),
            #[cfg(feature = "moka")]
            Store::Moka(config) => {
                use revalbox_moka::MokaStore;

                let store = MokaStore::builder()
                    .max_entries(config.max_capacity)
                    .build();
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "moka"))]
            Store::Moka(_) => Err(ConfigError::BackendNotAvailable("Moka".to_string())),
            #[cfg(feature = "redis")]
            Store::Redis(config) => {
                use revalbox_redis::RedisStore;

                let store = RedisStore::builder()
                    .server(config.connection_string)
                    .prefix(config.prefix)
                    .value_format(config.format.to_serializer())
                    .build()
                    .map_err(|e| ConfigError::BackendNotAvailable(format!("Redis: {}", e)))?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "redis"))]
            Store::Redis(_) => Err(ConfigError::BackendNotAvailable("Redis".to_string())),
        }
    }
}
