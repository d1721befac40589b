//! Redis store implementation.

use async_trait::async_trait;
use chrono::Utc;
use redis::{Client, aio::ConnectionManager};
use revalbox_backend::format::{Format, JsonFormat};
use revalbox_backend::{Store, StoreError, StoreResult};
use revalbox_core::{CacheEntry, CacheKey};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Connection string used when none is configured.
pub const DEFAULT_SERVER: &str = "redis://127.0.0.1/";

/// Prefix prepended to every Redis key when none is configured.
pub const DEFAULT_PREFIX: &str = "revalbox:";

/// Redis store based on the redis-rs crate.
///
/// It uses a [`ConnectionManager`] for asynchronous network interaction,
/// created on first use and shared by clones.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisStore<S = JsonFormat>
where
    S: Format,
{
    client: Client,
    connection: OnceCell<ConnectionManager>,
    serializer: S,
    prefix: String,
}

impl RedisStore<JsonFormat> {
    /// Create new store instance with default settings.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Creates new RedisStore builder with default settings.
    #[must_use]
    pub fn builder() -> RedisStoreBuilder<JsonFormat> {
        RedisStoreBuilder::default()
    }
}

impl<S> RedisStore<S>
where
    S: Format,
{
    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, Error> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await?;
        Ok(manager)
    }

    /// Redis key under which the entry for `key` is stored.
    pub fn redis_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl<S: Format> std::fmt::Debug for RedisStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .field("serializer", &self.serializer)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

/// Part of builder pattern implementation for RedisStore.
pub struct RedisStoreBuilder<S = JsonFormat>
where
    S: Format,
{
    connection_info: String,
    serializer: S,
    prefix: String,
}

impl Default for RedisStoreBuilder<JsonFormat> {
    fn default() -> Self {
        Self {
            connection_info: DEFAULT_SERVER.to_owned(),
            serializer: JsonFormat,
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }
}

impl<S> RedisStoreBuilder<S>
where
    S: Format,
{
    /// Set connection info (host, port, database, etc.) for RedisStore.
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Set the prefix prepended to every Redis key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set value serialization format (JSON, Bincode)
    pub fn value_format<NewS>(self, serializer: NewS) -> RedisStoreBuilder<NewS>
    where
        NewS: Format,
    {
        RedisStoreBuilder {
            connection_info: self.connection_info,
            serializer,
            prefix: self.prefix,
        }
    }

    /// Create new instance of Redis store with passed settings.
    ///
    /// Only the URL is validated here; the server is contacted on first use.
    pub fn build(self) -> Result<RedisStore<S>, Error> {
        Ok(RedisStore {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            serializer: self.serializer,
            prefix: self.prefix,
        })
    }
}

#[async_trait]
impl<S> Store for RedisStore<S>
where
    S: Format,
{
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        let mut con = self.connection().await?.clone();
        let redis_key = self.redis_key(key);

        let data: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&redis_key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        let Some(data) = data else {
            return Ok(None);
        };
        let entry = self.serializer.deserialize(&data)?;

        // Redis expiry has second-level slack; never hand out a dead entry.
        if entry.is_invalidatable(Utc::now()) {
            trace!(key = %redis_key, "Deleting invalidated entry");
            redis::cmd("DEL")
                .arg(&redis_key)
                .query_async::<()>(&mut con)
                .await
                .map_err(Error::from)?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn save(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        let mut con = self.connection().await?.clone();
        let redis_key = self.redis_key(key);
        let data = self.serializer.serialize(&entry)?;

        // Pipeline: SET + optional PEXPIRE for validator-less entries
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("SET").arg(&redis_key).arg(data.as_ref()).ignore();
        if let Some(ttl) = expiry_millis(&entry) {
            pipe.cmd("PEXPIRE").arg(&redis_key).arg(ttl).ignore();
        }

        pipe.query_async::<()>(&mut con)
            .await
            .map_err(|error| StoreError::from(Error::from(error)))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

/// Milliseconds until Redis may drop the entry, or `None` to keep it.
fn expiry_millis(entry: &CacheEntry) -> Option<u64> {
    if entry.has_validator() {
        return None;
    }
    entry.expires_at()?;
    let ttl = entry.time_to_live(Utc::now()).unwrap_or_default();
    Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
}
