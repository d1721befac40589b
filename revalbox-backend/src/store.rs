use std::sync::Arc;

use async_trait::async_trait;
use revalbox_core::{CacheEntry, CacheKey};

use crate::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for cache entries.
///
/// A store maps [`CacheKey`]s to [`CacheEntry`]s and nothing more: it does
/// not know about HTTP, conditional requests or freshness. Those decisions
/// belong to the caching client.
///
/// # Contract
///
/// - [`get`](Store::get) returns `Ok(None)` for a missing key. `Err` is for
///   faults of the storage itself.
/// - [`save`](Store::save) overwrites any previous entry under the key.
/// - Reads and writes of the same key are linearizable: a reader observes
///   either the old or the new entry, never a mix of both.
/// - A store may drop entries for which [`CacheEntry::is_invalidatable`]
///   holds, but must never return them as fresh.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the entry stored under `key`.
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>>;

    /// Stores `entry` under `key`, replacing any previous entry.
    async fn save(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()>;

    /// Returns the name of this store, used in logs and metric labels.
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        (**self).get(key).await
    }

    async fn save(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        (**self).save(key, entry).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S> Store for Box<S>
where
    S: Store + ?Sized,
{
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        (**self).get(key).await
    }

    async fn save(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        (**self).save(key, entry).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S> Store for &S
where
    S: Store + ?Sized,
{
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        (**self).get(key).await
    }

    async fn save(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        (**self).save(key, entry).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
