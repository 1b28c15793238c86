//! Bounded LRU store
//!
//! A `Mutex`-guarded [`lru::LruCache`] with hit/miss/eviction statistics.
//! Every read-modify-write goes through [`LruStore::upsert`], which holds the
//! lock for the whole update so concurrent callers serialize per store.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<K: Hash + Eq, V> {
    cache: LruCache<K, V>,
    stats: CacheStats,
}

/// Thread-safe LRU map with a fixed capacity
pub struct LruStore<K: Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a store holding at most `capacity` keys (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Get a value and mark it as recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let value = inner.cache.get(key).cloned();
        if value.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        value
    }

    /// Read a value without touching recency or statistics
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().cache.peek(key).cloned()
    }

    /// Insert a value, evicting the least recently used key when full
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut inner = self.inner.lock();
        Self::put_locked(&mut inner, key, value)
    }

    /// Atomically update the value for `key`, starting from `default` if absent
    ///
    /// Returns the value stored after the update.
    pub fn upsert<F>(&self, key: K, default: V, update: F) -> V
    where
        F: FnOnce(&mut V),
    {
        let mut inner = self.inner.lock();
        let mut value = match inner.cache.get(&key) {
            Some(existing) => existing.clone(),
            None => default,
        };
        update(&mut value);
        Self::put_locked(&mut inner, key, value.clone());
        value
    }

    /// Update the value for `key` in place, inserting `default()` first if absent
    ///
    /// Unlike [`LruStore::upsert`] nothing is cloned.
    pub fn modify<D, F>(&self, key: K, default: D, update: F)
    where
        D: FnOnce() -> V,
        F: FnOnce(&mut V),
    {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.cache.get_mut(&key) {
            update(existing);
            return;
        }
        let mut value = default();
        update(&mut value);
        Self::put_locked(&mut inner, key, value);
    }

    fn put_locked(inner: &mut Inner<K, V>, key: K, value: V) -> Option<V> {
        match inner.cache.push(key.clone(), value) {
            Some((old_key, old_value)) if old_key == key => Some(old_value),
            Some(_) => {
                inner.stats.evictions += 1;
                None
            }
            None => None,
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().cache.pop(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().cache.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cache.cap().get()
    }

    /// Drop every entry; statistics are kept
    pub fn clear(&self) {
        self.inner.lock().cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.cache.len(),
            ..inner.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_eviction() {
        let store = LruStore::new(2);
        store.insert("a", 1);
        store.insert("b", 2);
        // Touch "a" so "b" becomes least recently used
        assert_eq!(store.get(&"a"), Some(1));
        store.insert("c", 3);

        assert!(store.contains(&"a"));
        assert!(!store.contains(&"b"));
        assert!(store.contains(&"c"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_upsert_uses_default_then_existing() {
        let store: LruStore<&str, f64> = LruStore::new(4);
        assert_eq!(store.upsert("k", 0.0, |v| *v += 0.1), 0.1);
        let second = store.upsert("k", 0.0, |v| *v += 0.1);
        assert!((second - 0.2).abs() < 1e-9);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_modify_updates_in_place_and_refreshes_recency() {
        let store = LruStore::new(2);
        store.modify("a", Vec::new, |v: &mut Vec<u32>| v.push(1));
        store.insert("b", vec![]);
        store.modify("a", Vec::new, |v| v.push(2));
        store.insert("c", vec![]);

        assert_eq!(store.peek(&"a"), Some(vec![1, 2]));
        assert!(!store.contains(&"b"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_stats_and_clear() {
        let store: LruStore<String, u32> = LruStore::new(8);
        store.insert("x".to_string(), 1);
        store.get(&"x".to_string());
        store.get(&"y".to_string());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);

        store.clear();
        assert!(store.is_empty());
    }
}
