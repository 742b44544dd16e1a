//! Bounded Recency Cache Module
//!
//! Fixed-capacity key-value store with least-recently-used eviction.

use std::collections::{HashMap, VecDeque};

// == Bounded Recency Cache ==
/// Fixed-capacity store evicting the least recently used entry on overflow.
///
/// Recency order is kept in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
///
/// A `get` or `set` counts as a use; `has` deliberately does not, so
/// existence scans never disturb the eviction order.
#[derive(Debug)]
pub struct BoundedRecencyCache<V> {
    /// Key-value storage
    entries: HashMap<String, V>,
    /// Order of keys by access time
    order: VecDeque<String>,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl<V> BoundedRecencyCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    // == Get ==
    /// Returns the value and marks the key as most recently used.
    ///
    /// A miss has no side effect.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if self.entries.contains_key(key) {
            self.touch(key);
            self.entries.get(key)
        } else {
            None
        }
    }

    // == Set ==
    /// Inserts or refreshes a key, returning the key that had to be evicted
    /// when the insert pushed the cache past capacity.
    ///
    /// Refreshing an existing key never evicts; it only moves the key to
    /// the most-recently-used position.
    pub fn set(&mut self, key: &str, value: V) -> Option<String> {
        let is_overwrite = self.entries.contains_key(key);

        let mut evicted = None;
        if !is_overwrite && self.entries.len() >= self.capacity {
            evicted = self.evict_oldest();
        }

        self.entries.insert(key.to_string(), value);
        self.touch(key);
        evicted
    }

    // == Has ==
    /// Existence check that leaves the recency order untouched.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry, returning its value if it existed.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Iter ==
    /// Iterates entries without touching the recency order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }

    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    /// Marks a key as recently used (moves to front).
    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_front(key.to_string());
    }

    /// Removes and returns the least recently used key.
    fn evict_oldest(&mut self) -> Option<String> {
        let key = self.order.pop_back()?;
        self.entries.remove(&key);
        Some(key)
    }
}
