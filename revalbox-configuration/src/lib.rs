//! YAML configuration for revalbox caching clients.
//!
//! A [`ClientConfig`] describes how keys are derived and which store keeps
//! the entries. It only holds data; [`ClientConfig::into_store`] and
//! [`ClientConfig::into_client`] turn it into live objects.
#![warn(missing_docs)]

mod error;
pub mod store;

use std::path::Path;
use std::sync::Arc;

use revalbox::{CachingClient, Transport};
use revalbox_backend::Store as StoreTrait;
use revalbox_core::{HeaderOrder, KeyDeriver};
use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use store::{Moka, Redis, Store, ValueSerialization};

/// Cache key settings.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyConfig {
    /// How request headers are ordered before hashing.
    #[serde(default)]
    pub headers: HeaderOrder,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Cache key settings.
    #[serde(default)]
    pub key: KeyConfig,
    /// Where entries are kept.
    #[serde(default)]
    pub store: Store,
}

impl ClientConfig {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Builds the key deriver.
    pub fn key_deriver(&self) -> KeyDeriver {
        KeyDeriver::new(self.key.headers)
    }

    /// Builds the configured store.
    pub fn into_store(self) -> Result<Arc<dyn StoreTrait>, ConfigError> {
        self.store.into_store()
    }

    /// Builds a caching client around `transport`.
    pub fn into_client<T>(self, transport: T) -> Result<CachingClient<T, Arc<dyn StoreTrait>>, ConfigError>
    where
        T: Transport,
    {
        let keys = self.key_deriver();
        let store = self.into_store()?;
        Ok(CachingClient::builder()
            .transport(transport)
            .store(store)
            .key_deriver(keys)
            .build())
    }
}
