//! Integration tests for inactivity-driven tier expiry.
//!
//! Instead of sleeping, these tests rewind the persisted last-change
//! timestamp and rebuild the cache over the same store. That exercises
//! the same code path a real idle period would (the engine only ever
//! compares "now" against the stored timestamp) and doubles as a test of
//! instance reconstruction over persisted state.

use serde_json::json;

use tier_cache::{
    FileStore, KeyValueStore, MemoryStore, TierSpec, TieredCache, LAST_CHANGE_KEY,
};

fn tiers() -> Vec<TierSpec> {
    vec![
        TierSpec {
            name: "A".to_string(),
            expiration_ms: 500,
        },
        TierSpec {
            name: "B".to_string(),
            expiration_ms: 1000,
        },
        TierSpec {
            name: "C".to_string(),
            expiration_ms: 1500,
        },
    ]
}

/// Build a cache holding one entry per tier, then hand back the store
/// with its last-change timestamp rewound by `idle_ms`.
fn idle_store(idle_ms: u64) -> MemoryStore {
    let mut cache = TieredCache::new(MemoryStore::new(), &tiers());
    assert!(cache.set("test", &json!({"hello": "123"}), "A"));
    assert!(cache.set("test2", &json!({"hello": "321"}), "B"));
    assert!(cache.set("test3", &json!({"hello": "456"}), "C"));

    let mut store = cache.into_store();
    rewind(&mut store, idle_ms);
    store
}

fn rewind(store: &mut MemoryStore, idle_ms: u64) {
    let raw = store.get_item(LAST_CHANGE_KEY).unwrap().unwrap();
    let ts: u64 = raw.parse().unwrap();
    store
        .set_item(LAST_CHANGE_KEY, &(ts - idle_ms).to_string())
        .unwrap();
}

#[test]
fn test_all_tiers_survive_short_inactivity() {
    let store = idle_store(250);
    let mut cache = TieredCache::new(store, &tiers());

    // 250ms is below every expiration: the read must see the entry and
    // nothing may be purged.
    assert_eq!(
        cache.get::<serde_json::Value>("test"),
        Some(json!({"hello": "123"}))
    );

    let store = cache.into_store();
    assert!(store.get_item("C-B-A-test").unwrap().is_some());
    assert!(store.get_item("C-B-test2").unwrap().is_some());
    assert!(store.get_item("C-test3").unwrap().is_some());
}

#[test]
fn test_shortest_tier_expires_first() {
    let store = idle_store(750);
    let mut cache = TieredCache::new(store, &tiers());

    // 750ms: tier A (500ms) is stale, B and C are not.
    assert_eq!(cache.get::<serde_json::Value>("test"), None);

    let store = cache.into_store();
    assert!(store.get_item("C-B-A-test").unwrap().is_none());
    assert!(store.get_item("C-B-test2").unwrap().is_some());
    assert!(store.get_item("C-test3").unwrap().is_some());
}

#[test]
fn test_cascade_expires_nested_tiers_together() {
    let store = idle_store(1250);
    let mut cache = TieredCache::new(store, &tiers());

    // 1250ms: B is stale, and A is nested inside B's namespace.
    assert_eq!(cache.get::<serde_json::Value>("test2"), None);

    let store = cache.into_store();
    assert!(store.get_item("C-B-A-test").unwrap().is_none());
    assert!(store.get_item("C-B-test2").unwrap().is_none());
    assert!(store.get_item("C-test3").unwrap().is_some());
}

#[test]
fn test_full_expiry_leaves_only_metadata() {
    let store = idle_store(1750);
    let mut cache = TieredCache::new(store, &tiers());

    assert_eq!(cache.get::<serde_json::Value>("test3"), None);

    let store = cache.into_store();
    assert!(store.get_item(LAST_CHANGE_KEY).unwrap().is_some());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_access_resets_the_window() {
    let store = idle_store(250);
    let mut cache = TieredCache::new(store, &tiers());

    // A read below every expiration resets last-change; rewinding by
    // another 400ms afterwards still totals under tier A's 500ms.
    assert!(cache.get::<serde_json::Value>("test").is_some());

    let mut store = cache.into_store();
    rewind(&mut store, 400);
    let mut cache = TieredCache::new(store, &tiers());
    assert!(cache.get::<serde_json::Value>("test").is_some());
}

#[test]
fn test_expired_key_can_rebind_to_another_tier() {
    let store = idle_store(750);
    let mut cache = TieredCache::new(store, &tiers());

    // Tier A expired, so the old binding is gone and the logical key is
    // free to live under B now.
    assert_eq!(cache.get::<serde_json::Value>("test"), None);
    assert!(cache.set("test", &json!("moved"), "B"));

    let store = cache.into_store();
    assert!(store.get_item("C-B-test").unwrap().is_some());
}

#[test]
fn test_set_triggers_purge_of_stale_tiers() {
    let store = idle_store(750);
    let mut cache = TieredCache::new(store, &tiers());

    // A mutation, not just a read, runs invalidation too.
    assert!(cache.set("fresh", &json!(1), "C"));

    let store = cache.into_store();
    assert!(store.get_item("C-B-A-test").unwrap().is_none());
    assert!(store.get_item("C-fresh").unwrap().is_some());
}

#[test]
fn test_timestamp_survives_reconstruction_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(&path).unwrap();
        let mut cache = TieredCache::new(store, &tiers());
        assert!(cache.set("test", &json!({"hello": "123"}), "A"));
    }

    // A fresh process over the same file sees the persisted timestamp
    // and the entry.
    let store = FileStore::open(&path).unwrap();
    assert!(store.get_item(LAST_CHANGE_KEY).unwrap().is_some());

    let mut cache = TieredCache::new(store, &tiers());
    assert_eq!(
        cache.get::<serde_json::Value>("test"),
        Some(json!({"hello": "123"}))
    );
}

#[test]
fn test_rewound_file_store_expires_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(&path).unwrap();
        let mut cache = TieredCache::new(store, &tiers());
        cache.set("test", &json!(1), "A");
        cache.set("test3", &json!(3), "C");
    }

    // Simulate 750ms of idle time between processes.
    {
        let mut store = FileStore::open(&path).unwrap();
        let raw = store.get_item(LAST_CHANGE_KEY).unwrap().unwrap();
        let ts: u64 = raw.parse().unwrap();
        store
            .set_item(LAST_CHANGE_KEY, &(ts - 750).to_string())
            .unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    let mut cache = TieredCache::new(store, &tiers());
    assert_eq!(cache.get::<serde_json::Value>("test"), None);
    assert_eq!(cache.get::<serde_json::Value>("test3"), Some(json!(3)));
}
