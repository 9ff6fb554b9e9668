//! Bounded LRU cache with per-entry TTL

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One cached entry
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
    etag: Option<String>,
}

impl<V> CacheEntry<V> {
    fn is_valid(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) < self.ttl
    }
}

#[derive(Debug, Default)]
struct LruState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    // Front = least recently used, back = most recently used
    recency: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> LruState<K, V> {
    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            let key = self.recency.remove(pos).unwrap();
            self.recency.push_back(key);
        }
    }

    fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
        self.entries.remove(key)
    }
}

/// Bounded LRU cache with per-entry TTL
///
/// - Insertion past capacity evicts the least-recently-used entry.
/// - A get moves the entry to most-recently-used but does not reset its TTL.
/// - Expired entries are misses; they are dropped lazily on access.
///
/// A zero capacity disables the cache: every insert is discarded.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    state: Mutex<LruState<K, V>>,
    capacity: usize,
    default_ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// Create a cache with the given capacity and default TTL
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(LruState {
                entries: HashMap::new(),
                recency: VecDeque::new(),
            }),
            capacity,
            default_ttl,
        }
    }

    /// Get a valid entry, updating recency
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let hit = match state.entries.get(key) {
            Some(entry) if entry.is_valid(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => return None,
        };
        match hit {
            Some(value) => {
                state.touch(key);
                Some(value)
            }
            None => {
                // Expired: drop it so the slot frees up
                state.remove(key);
                None
            }
        }
    }

    /// Get an entry regardless of TTL, with its entity tag
    ///
    /// Used for conditional revalidation: a stale entry plus its etag lets
    /// the HTTP layer send `If-None-Match` and reuse the body on 304.
    pub fn get_stale(&self, key: &K) -> Option<(V, Option<String>)> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.etag.clone()))
    }

    /// Restart an entry's TTL window after a successful revalidation
    pub fn revalidate(&self, key: &K) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.entries.get_mut(key) {
            entry.inserted_at = Instant::now();
        }
        state.touch(key);
    }

    /// Insert with the default TTL
    pub fn insert(&self, key: K, value: V) {
        self.insert_with(key, value, self.default_ttl, None);
    }

    /// Insert with an explicit TTL and optional entity tag
    pub fn insert_with(&self, key: K, value: V, ttl: Duration, etag: Option<String>) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state.lock().unwrap();
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
            etag,
        };
        if state.entries.insert(key.clone(), entry).is_some() {
            state.touch(&key);
        } else {
            state.recency.push_back(key);
            while state.entries.len() > self.capacity {
                if let Some(oldest) = state.recency.pop_front() {
                    state.entries.remove(&oldest);
                } else {
                    break;
                }
            }
        }
    }

    /// Remove an entry
    pub fn remove(&self, key: &K) -> bool {
        self.state.lock().unwrap().remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        state.recency.clear();
    }

    /// Number of entries, including not-yet-collected expired ones
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// True when the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> TtlCache<String, u32> {
        TtlCache::new(capacity, Duration::from_secs(60))
    }

    #[test]
    fn get_returns_inserted_value() {
        let cache = cache(4);
        cache.insert("a".into(), 1);
        assert_eq!(cache.get(&"a".into()), Some(1));
        assert_eq!(cache.get(&"b".into()), None);
    }

    #[test]
    fn eviction_removes_least_recently_used() {
        let cache = cache(2);
        cache.insert("a".into(), 1);
        cache.insert("b".into(), 2);
        // Read "a" so "b" becomes the LRU entry
        assert_eq!(cache.get(&"a".into()), Some(1));
        cache.insert("c".into(), 3);
        assert_eq!(cache.get(&"a".into()), Some(1));
        assert_eq!(cache.get(&"b".into()), None);
        assert_eq!(cache.get(&"c".into()), Some(3));
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache: TtlCache<String, u32> = TtlCache::new(4, Duration::from_millis(0));
        cache.insert("a".into(), 1);
        assert_eq!(cache.get(&"a".into()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn get_does_not_extend_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(4, Duration::from_millis(40));
        cache.insert("a".into(), 1);
        std::thread::sleep(Duration::from_millis(25));
        // Still valid, and reading it must not restart the clock
        assert_eq!(cache.get(&"a".into()), Some(1));
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"a".into()), None);
    }

    #[test]
    fn stale_reads_keep_the_entry_and_expose_the_etag() {
        let cache: TtlCache<String, u32> = TtlCache::new(4, Duration::from_millis(0));
        cache.insert_with("a".into(), 7, Duration::from_millis(0), Some("W/\"x\"".into()));
        let (value, etag) = cache.get_stale(&"a".into()).unwrap();
        assert_eq!(value, 7);
        assert_eq!(etag.as_deref(), Some("W/\"x\""));
        // Revalidation restarts the TTL window
        cache.revalidate(&"a".into());
        assert_eq!(cache.get_stale(&"a".into()).map(|(v, _)| v), Some(7));
    }

    #[test]
    fn zero_capacity_discards_everything() {
        let cache = cache(0);
        cache.insert("a".into(), 1);
        assert_eq!(cache.get(&"a".into()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn reinsert_updates_value_without_growing() {
        let cache = cache(2);
        cache.insert("a".into(), 1);
        cache.insert("a".into(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a".into()), Some(2));
    }
}
