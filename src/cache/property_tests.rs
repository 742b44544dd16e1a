//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify eviction, key determinism, and statistics
//! correctness properties of the cache core.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use crate::cache::persistent::MemoryStore;
use crate::cache::{
    generate_key, BoundedRecencyCache, CacheEntry, InMemoryStringStore, SessionTier,
    TieredCacheManager,
};
use crate::config::CacheConfig;

// == Strategies ==
/// Generates valid cache keys (non-empty, bounded length)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}".prop_map(|s| s)
}

/// Generates valid string payloads
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of set operations, the number of entries in the
    // recency cache never exceeds its capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let capacity = 50;
        let mut cache = BoundedRecencyCache::new(capacity);

        for (key, value) in entries {
            cache.set(&key, value);
            prop_assert!(
                cache.len() <= capacity,
                "Cache size {} exceeds capacity {}",
                cache.len(),
                capacity
            );
        }
    }

    // For any set of unique keys filling the cache to capacity, inserting a
    // fresh key evicts exactly the least recently used one.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys: Vec<String> = initial_keys
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = BoundedRecencyCache::new(capacity);

        // First key added is the eviction candidate
        let oldest_key = unique_keys[0].clone();
        for key in &unique_keys {
            cache.set(key, format!("value_{}", key));
        }

        prop_assert_eq!(cache.len(), capacity);

        let evicted = cache.set(&new_key, new_value);

        prop_assert_eq!(evicted, Some(oldest_key.clone()));
        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.has(&oldest_key));
        prop_assert!(cache.has(&new_key));

        for key in unique_keys.iter().skip(1) {
            prop_assert!(cache.has(key), "Key '{}' should still exist", key);
        }
    }

    // A get on an existing key makes it most recently used, so it is never
    // the next eviction candidate.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys: Vec<String> = keys
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = BoundedRecencyCache::new(capacity);

        for key in &unique_keys {
            cache.set(key, format!("value_{}", key));
        }

        // Touch the would-be eviction candidate via get
        let accessed_key = unique_keys[0].clone();
        cache.get(&accessed_key);

        // The second key is now oldest
        let expected_evicted = unique_keys[1].clone();
        let evicted = cache.set(&new_key, new_value);

        prop_assert_eq!(evicted, Some(expected_evicted));
        prop_assert!(cache.has(&accessed_key));
        prop_assert!(cache.has(&new_key));
    }

    // Param insertion order never changes the generated key, and distinct
    // identifiers always produce distinct keys.
    #[test]
    fn prop_key_determinism(
        category in valid_key_strategy(),
        identifier in valid_key_strategy(),
        other_identifier in valid_key_strategy(),
        params in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            0..6
        )
    ) {
        let forward: Vec<(&str, &str)> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        prop_assert_eq!(
            generate_key(&category, &identifier, &forward),
            generate_key(&category, &identifier, &reversed)
        );

        if identifier != other_identifier {
            prop_assert_ne!(
                generate_key(&category, &identifier, &forward),
                generate_key(&category, &other_identifier, &forward)
            );
        }
    }

    // Storing an envelope in the session tier and reading it back returns
    // the exact value that was stored.
    #[test]
    fn prop_session_roundtrip(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut tier = SessionTier::new(100, Box::new(InMemoryStringStore::new()));

        tier.set(&key, &CacheEntry::new(json!(value.clone()), "players"));

        let read = tier.get(&key).unwrap();
        prop_assert_eq!(read.data, json!(value));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // For any sequence of manager operations, the hit and miss counters
    // reflect exactly the reads that were answered and not answered.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let config = CacheConfig {
                memory_capacity: 100,
                session_capacity: 100,
                session_quota_bytes: None,
                ..CacheConfig::default()
            };
            let manager =
                TieredCacheManager::with_store(&config, Arc::new(MemoryStore::default()));

            let mut expected_hits: u64 = 0;
            let mut expected_misses: u64 = 0;

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        manager.set(&key, json!(value), "players").await;
                    }
                    CacheOp::Get { key } => match manager.get(&key, 600_000).await {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    },
                }
            }

            let stats = manager.stats().await;
            prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
            prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
            Ok(())
        })?;
    }
}
