//! In-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use revalbox_core::{CacheEntry, CacheKey};
use tracing::trace;

use crate::{Store, StoreResult};

/// Unbounded in-memory store guarded by a reader/writer lock.
///
/// Reads take the shared lock. A read that finds an entry which can no
/// longer be used (see [`CacheEntry::is_invalidatable`]) re-acquires the
/// lock exclusively, deletes the entry and reports a miss.
///
/// Cloning is cheap and clones share the same map, so one store can back
/// many clients.
///
/// # Caveats
///
/// - Data is **not persisted**; the cache is lost on process restart.
/// - There is **no eviction** besides the lazy invalidation above: entries
///   with validators live forever. Use `revalbox-moka` when memory must be
///   bounded.
///
/// ```
/// use bytes::Bytes;
/// use revalbox_backend::{MemoryStore, Store};
/// use revalbox_core::{CacheEntry, CacheKey};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryStore::new();
/// let key = CacheKey::from_bytes([7; CacheKey::LEN]);
/// let entry = CacheEntry::new(Bytes::from_static(b"body"), Some("\"v1\"".into()), None, None);
///
/// store.save(&key, entry.clone()).await.unwrap();
/// assert_eq!(store.get(&key).await.unwrap(), Some(entry));
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including ones not yet lazily invalidated.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a copy of every stored entry.
    pub fn entries(&self) -> Vec<(CacheKey, CacheEntry)> {
        self.entries
            .read()
            .iter()
            .map(|(key, entry)| (*key, entry.clone()))
            .collect()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Deletes every entry that is invalidatable at `now`.
    ///
    /// This is the eager counterpart of the delete-on-read done by
    /// [`Store::get`]. Returns the number of deleted entries.
    pub fn purge_invalidated(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_invalidatable(now));
        before - entries.len()
    }

    fn lookup(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CacheEntry> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_invalidatable(now) => return Some(entry.clone()),
                Some(_) => {}
            }
        }

        // Another writer may have replaced the entry between the two locks.
        let mut entries = self.entries.write();
        let invalidated = entries
            .get(key)
            .is_some_and(|entry| entry.is_invalidatable(now));
        if invalidated {
            trace!(?key, "Deleting invalidated entry");
            entries.remove(key);
            return None;
        }
        entries.get(key).cloned()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .finish()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        Ok(self.lookup(key, Utc::now()))
    }

    async fn save(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        self.entries.write().insert(*key, entry);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Duration;

    fn key(n: u8) -> CacheKey {
        CacheKey::from_bytes([n; CacheKey::LEN])
    }

    fn expired_without_validator() -> CacheEntry {
        CacheEntry::new(
            Bytes::from_static(b"old"),
            None,
            None,
            Some(Utc::now() - Duration::seconds(5)),
        )
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&key(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_overwrites() {
        let store = MemoryStore::new();
        let first = CacheEntry::new(Bytes::from_static(b"1"), Some("a".into()), None, None);
        let second = CacheEntry::new(Bytes::from_static(b"2"), Some("b".into()), None, None);
        store.save(&key(1), first).await.unwrap();
        store.save(&key(1), second.clone()).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key(1)).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn get_deletes_invalidated_entry() {
        let store = MemoryStore::new();
        store.save(&key(1), expired_without_validator()).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key(1)).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn get_keeps_expired_entry_with_validator() {
        let store = MemoryStore::new();
        let entry = CacheEntry::new(
            Bytes::from_static(b"old"),
            Some("\"v1\"".into()),
            None,
            Some(Utc::now() - Duration::seconds(5)),
        );
        store.save(&key(1), entry.clone()).await.unwrap();
        assert_eq!(store.get(&key(1)).await.unwrap(), Some(entry));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn purge_removes_only_invalidated() {
        let store = MemoryStore::new();
        let keep = CacheEntry::new(Bytes::new(), None, Some("date".into()), None);
        store.save(&key(1), expired_without_validator()).await.unwrap();
        store.save(&key(2), expired_without_validator()).await.unwrap();
        store.save(&key(3), keep).await.unwrap();
        assert_eq!(store.purge_invalidated(Utc::now()), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryStore::new();
        let clone = store.clone();
        let entry = CacheEntry::new(Bytes::new(), Some("x".into()), None, None);
        clone.save(&key(9), entry).await.unwrap();
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(clone.is_empty());
    }
}
