//! Caching layer
//!
//! Two cache shapes back the providers: a bounded LRU map with per-entry TTL
//! for individual resources, and a single-slot cache for the catalog index.
//! Both share the same validity rule: an entry is valid while
//! `now - inserted_at < ttl`. A read updates recency, never the TTL window.

pub mod index_slot;
pub mod lru;

pub use index_slot::IndexCache;
pub use lru::TtlCache;
