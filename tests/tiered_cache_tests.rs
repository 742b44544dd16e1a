//! Integration Tests for the Tiered Cache
//!
//! Exercises the full consumer path: cache_api_call over all three tiers,
//! expiry-driven refetching, category invalidation, and durability of the
//! persistent tier across manager instances.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use tiercache::cache::{MemoryStore, PersistentStore, SqliteStore, TieredCacheManager};
use tiercache::CacheConfig;

// == Helper Functions ==

fn test_config() -> CacheConfig {
    CacheConfig {
        memory_capacity: 10,
        session_capacity: 20,
        session_quota_bytes: None,
        persistent_path: None,
        ..CacheConfig::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerStats {
    win_rate: u32,
}

// == Consumer Scenario ==

#[tokio::test]
async fn test_consumer_hit_miss_expiry_cycle() {
    let persistent = Arc::new(MemoryStore::default());
    let manager = TieredCacheManager::with_store(&test_config(), persistent.clone());

    let calls = AtomicUsize::new(0);
    let win_rate = AtomicU32::new(52);
    let ttl_ms = 200;

    let fetch = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(PlayerStats {
            win_rate: win_rate.load(Ordering::SeqCst),
        })
    };

    // First call: full miss, the producer runs
    let first: PlayerStats = manager
        .cache_api_call("players", "87287966", fetch, &[], ttl_ms)
        .await
        .unwrap();
    assert_eq!(first, PlayerStats { win_rate: 52 });
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Immediate second call: served from cache, producer untouched
    let second: PlayerStats = manager
        .cache_api_call("players", "87287966", fetch, &[], ttl_ms)
        .await
        .unwrap();
    assert_eq!(second, PlayerStats { win_rate: 52 });
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Past the TTL the producer runs again and every tier is refreshed
    win_rate.store(55, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(ttl_ms + 50)).await;

    let third: PlayerStats = manager
        .cache_api_call("players", "87287966", fetch, &[], ttl_ms)
        .await
        .unwrap();
    assert_eq!(third, PlayerStats { win_rate: 55 });
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let key = TieredCacheManager::generate_key("players", "87287966", &[]);
    let record = persistent.get(&key).unwrap().unwrap();
    assert_eq!(record.decode().unwrap(), json!({"winRate": 55}));
}

#[tokio::test]
async fn test_failed_fetch_then_successful_retry() {
    let manager = TieredCacheManager::with_store(&test_config(), Arc::new(MemoryStore::default()));

    let result: tiercache::Result<PlayerStats> = manager
        .cache_api_call(
            "players",
            "87287966",
            || async { Err(anyhow::anyhow!("rate limited")) },
            &[],
            600_000,
        )
        .await;
    assert!(result.is_err());

    // The failure left nothing behind, so the retry runs the producer and
    // caches its result
    let retried: PlayerStats = manager
        .cache_api_call(
            "players",
            "87287966",
            || async { Ok(PlayerStats { win_rate: 48 }) },
            &[],
            600_000,
        )
        .await
        .unwrap();
    assert_eq!(retried, PlayerStats { win_rate: 48 });

    let stats = manager.stats().await;
    assert_eq!(stats.memory.count, 1);
}

// == Category Invalidation ==

#[tokio::test]
async fn test_category_invalidation_spans_all_tiers() {
    let persistent = Arc::new(MemoryStore::default());
    let manager = TieredCacheManager::with_store(&test_config(), persistent.clone());

    manager.set("heroes:all", json!(["axe", "lina"]), "heroes").await;
    manager.set("heroes:axe", json!({"id": 1}), "heroes").await;
    manager.set("players:1", json!({"winRate": 52}), "players").await;

    manager.clear_category("heroes").await;

    assert!(manager.get("heroes:all", 600_000).await.is_none());
    assert!(manager.get("heroes:axe", 600_000).await.is_none());
    assert_eq!(
        manager.get("players:1", 600_000).await,
        Some(json!({"winRate": 52}))
    );

    // The persistent tier dropped the category too
    assert!(persistent.get("heroes:all").unwrap().is_none());
    assert!(persistent.get("players:1").unwrap().is_some());
}

// == Durability ==

#[tokio::test]
async fn test_persistent_tier_survives_manager_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let manager = TieredCacheManager::with_store(&test_config(), store);
        manager.set("heroes:all", json!(["axe", "lina"]), "heroes").await;
    }

    // A fresh manager over the same database starts with cold in-heap
    // tiers but finds the durable copy and promotes it
    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let manager = TieredCacheManager::with_store(&test_config(), store);

    assert_eq!(
        manager.get("heroes:all", 600_000).await,
        Some(json!(["axe", "lina"]))
    );

    let stats = manager.stats().await;
    assert_eq!(stats.memory.count, 1, "hit should have been promoted");
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_ttl_is_a_read_time_policy() {
    let manager = TieredCacheManager::with_store(&test_config(), Arc::new(MemoryStore::default()));

    manager.set("matches:recent", json!([1, 2, 3]), "matches").await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    // The same physical entry is stale for a tight deadline and fresh for
    // a loose one
    assert!(manager.get("matches:recent", 10).await.is_none());
    assert_eq!(
        manager.get("matches:recent", 600_000).await,
        Some(json!([1, 2, 3]))
    );
}
