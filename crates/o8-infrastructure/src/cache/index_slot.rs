//! Single-slot index cache
//!
//! The catalog index is cached under one provider-scoped slot with a long
//! TTL. Same validity rule as the LRU cache; recency is meaningless for a
//! single slot, so only TTL applies.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    inserted_at: Instant,
    etag: Option<String>,
}

/// Single-slot cache with TTL and entity-tag support
#[derive(Debug)]
pub struct IndexCache<V> {
    slot: Mutex<Option<Slot<V>>>,
    ttl: Duration,
}

impl<V: Clone> IndexCache<V> {
    /// Create an empty slot with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Get the cached index while it is still valid
    pub fn get(&self) -> Option<V> {
        let slot = self.slot.lock().unwrap();
        slot.as_ref()
            .filter(|s| s.inserted_at.elapsed() < self.ttl)
            .map(|s| s.value.clone())
    }

    /// Get the cached index regardless of TTL, with its entity tag
    pub fn get_stale(&self) -> Option<(V, Option<String>)> {
        let slot = self.slot.lock().unwrap();
        slot.as_ref().map(|s| (s.value.clone(), s.etag.clone()))
    }

    /// Store a fresh index
    pub fn set(&self, value: V, etag: Option<String>) {
        let mut slot = self.slot.lock().unwrap();
        *slot = Some(Slot {
            value,
            inserted_at: Instant::now(),
            etag,
        });
    }

    /// Restart the TTL window after a successful 304 revalidation
    pub fn revalidate(&self) {
        let mut slot = self.slot.lock().unwrap();
        if let Some(slot) = slot.as_mut() {
            slot.inserted_at = Instant::now();
        }
    }

    /// Drop the cached index
    pub fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }

    /// True when a value is cached, valid or not
    pub fn is_populated(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }
}
