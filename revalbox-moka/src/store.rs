//! Moka store implementation.

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use revalbox_backend::{Store, StoreResult};
use revalbox_core::{CacheEntry, CacheKey};
use tracing::trace;

use crate::builder::{MokaStoreBuilder, NoCapacity};

/// Bounded in-memory store powered by Moka.
///
/// Entries are kept as-is, without serialization. Validator-less entries
/// expire when their freshness runs out; entries with a validator are only
/// removed by eviction.
///
/// # Caveats
///
/// - Data is **not persisted**; the cache is lost on process restart
/// - Data is **not shared** across processes; use Redis for that
/// - Expiration is **best-effort**, so [`Store::get`] re-checks entries and
///   drops the ones that can no longer be used
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<CacheKey, CacheEntry>,
}

impl MokaStore {
    /// Creates a new builder. Capacity must be set before building.
    pub fn builder() -> MokaStoreBuilder<NoCapacity> {
        MokaStoreBuilder::new()
    }

    pub(crate) fn from_cache(cache: Cache<CacheKey, CacheEntry>) -> Self {
        MokaStore { cache }
    }

    /// Returns the underlying Moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, CacheEntry> {
        &self.cache
    }

    /// Approximate number of entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("cache", &self.cache)
            .finish()
    }
}

#[async_trait]
impl Store for MokaStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        let Some(entry) = self.cache.get(key).await else {
            return Ok(None);
        };
        if entry.is_invalidatable(Utc::now()) {
            trace!(?key, "Deleting invalidated entry");
            self.cache.invalidate(key).await;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn save(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        self.cache.insert(*key, entry).await;
        crate::metrics::record_capacity(self.cache.entry_count(), self.cache.weighted_size());
        Ok(())
    }

    fn name(&self) -> &str {
        "moka"
    }
}
