//! Builder for configuring [`MokaStore`].

use std::time::{Duration, Instant};

use chrono::Utc;
use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use revalbox_core::{CacheEntry, CacheKey};

use crate::store::MokaStore;

/// Fixed per-entry overhead counted by the byte weigher: key, timestamps and
/// map bookkeeping.
const ENTRY_OVERHEAD: usize = 96;

/// Expiration policy derived from each entry's freshness.
///
/// Entries with a validator never expire on time alone: once stale they are
/// still needed to build a conditional request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration;

impl Expiry<CacheKey, CacheEntry> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Self::calculate_ttl(value)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // The default keeps the old deadline; a replaced entry brings its own.
        Self::calculate_ttl(value)
    }
}

impl Expiration {
    fn calculate_ttl(value: &CacheEntry) -> Option<Duration> {
        if value.has_validator() {
            return None;
        }
        value.expires_at()?;
        Some(value.time_to_live(Utc::now()).unwrap_or(Duration::ZERO))
    }
}

/// Marker type: capacity has not been configured yet.
///
/// Call either [`max_entries()`](MokaStoreBuilder::max_entries) or
/// [`max_bytes()`](MokaStoreBuilder::max_bytes) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaStore`].
///
/// Use [`MokaStore::builder`] to create a new builder instance. Capacity is
/// mandatory and set with exactly one of [`max_entries`](Self::max_entries)
/// or [`max_bytes`](Self::max_bytes); `build()` only exists afterwards.
#[derive(Debug)]
pub struct MokaStoreBuilder<Cap> {
    capacity: Cap,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaStoreBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        MokaStoreBuilder {
            capacity: NoCapacity,
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries the store can hold.
    pub fn max_entries(self, capacity: u64) -> MokaStoreBuilder<EntryCapacity> {
        MokaStoreBuilder {
            capacity: EntryCapacity(capacity),
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the maximum memory budget in bytes.
    ///
    /// Each entry weighs its body and validator lengths plus a fixed
    /// overhead.
    pub fn max_bytes(self, bytes: u64) -> MokaStoreBuilder<ByteCapacity> {
        MokaStoreBuilder {
            capacity: ByteCapacity(bytes),
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaStoreBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaStoreBuilder<Cap> {
    /// Sets the eviction policy.
    ///
    /// Defaults to TinyLFU for [`max_entries`](MokaStoreBuilder::max_entries)
    /// and LRU for [`max_bytes`](MokaStoreBuilder::max_bytes).
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaStoreBuilder<EntryCapacity> {
    /// Builds the store with entry-count based capacity.
    pub fn build(self) -> MokaStore {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<CacheKey, CacheEntry> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();
        MokaStore::from_cache(cache)
    }
}

impl MokaStoreBuilder<ByteCapacity> {
    /// Builds the store with byte-based capacity.
    ///
    /// LRU is the default here: TinyLFU's admission policy can reject new
    /// entries even when eviction could make room.
    pub fn build(self) -> MokaStore {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<CacheKey, CacheEntry> = CacheBuilder::new(self.capacity.0)
            .weigher(byte_weigher)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();
        MokaStore::from_cache(cache)
    }
}

fn byte_weigher(_key: &CacheKey, value: &CacheEntry) -> u32 {
    let size = ENTRY_OVERHEAD
        + value.body().len()
        + value.etag().map_or(0, str::len)
        + value.last_modified().map_or(0, str::len);
    u32::try_from(size).unwrap_or(u32::MAX)
}
