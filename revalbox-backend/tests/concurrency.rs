//! Concurrent access to the in-memory store.

use bytes::Bytes;
use chrono::{Duration, Utc};
use revalbox_backend::{MemoryStore, Store};
use revalbox_core::{CacheEntry, CacheKey};

fn entry(version: u32) -> CacheEntry {
    CacheEntry::new(
        Bytes::from(format!("body-{version}")),
        Some(format!("\"{version}\"")),
        None,
        None,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_torn_entries() {
    let store = MemoryStore::new();
    let key = CacheKey::from_bytes([1; CacheKey::LEN]);
    store.save(&key, entry(0)).await.unwrap();

    let writers = (1..=50u32).map(|version| {
        let store = store.clone();
        tokio::spawn(async move { store.save(&key, entry(version)).await.unwrap() })
    });
    let readers = (0..200).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            let found = store.get(&key).await.unwrap().expect("entry always present");
            let version = found.etag().unwrap().trim_matches('"').to_owned();
            assert_eq!(found.body(), &Bytes::from(format!("body-{version}")));
        })
    });

    let handles: Vec<_> = writers.chain(readers).collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invalidation_deletes_once() {
    let store = MemoryStore::new();
    let key = CacheKey::from_bytes([2; CacheKey::LEN]);
    let expired = CacheEntry::new(
        Bytes::from_static(b"gone"),
        None,
        None,
        Some(Utc::now() - Duration::seconds(1)),
    );
    store.save(&key, expired).await.unwrap();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.get(&key).await.unwrap() })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        assert_eq!(result.unwrap(), None);
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn shared_through_trait_objects() {
    let store = MemoryStore::new();
    let shared: std::sync::Arc<dyn Store> = std::sync::Arc::new(store.clone());
    let key = CacheKey::from_bytes([3; CacheKey::LEN]);

    shared.save(&key, entry(7)).await.unwrap();
    assert_eq!(shared.name(), "memory");
    assert_eq!(store.get(&key).await.unwrap(), Some(entry(7)));
}
