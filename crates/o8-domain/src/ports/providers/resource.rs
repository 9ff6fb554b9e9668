//! Resource Provider Port
//!
//! The common operational contract every backend implements: lifecycle,
//! catalog access, search, health, and statistics. The registry composes
//! providers solely through this trait.
//!
//! ## Provider Pattern
//!
//! Implementations are constructed from their own configuration and injected
//! into the registry at startup; there is no global provider table. Each
//! provider owns its caches, its rate buckets, and its counters.

use crate::entities::{Resource, ResourceCategory};
use crate::error::Result;
use crate::value_objects::{HealthRecord, ProviderStats, ResourceIndex, SearchOptions, SearchResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Resource provider contract
///
/// ## Thread Safety
///
/// All implementations must be `Send + Sync`; the registry calls them
/// concurrently. `set_enabled` takes `&self` and must use interior
/// mutability.
///
/// ## Stats Discipline
///
/// Every non-trivial operation updates the provider's counters so that
/// `total == successful + failed + cached` holds at all times.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Stable label identifying this provider
    fn label(&self) -> &str;

    /// Dispatch priority; lower runs first
    fn priority(&self) -> i32;

    /// Whether this provider currently accepts requests
    fn is_enabled(&self) -> bool;

    /// Enable or disable this provider
    fn set_enabled(&self, enabled: bool);

    /// Validate configuration and perform an initial reachability check
    ///
    /// Failures are non-fatal (logged) except an inaccessible resource
    /// root, which is fatal for filesystem-backed providers. Idempotent.
    async fn initialize(&self) -> Result<()>;

    /// Flush caches and release background resources. Idempotent.
    async fn shutdown(&self) -> Result<()>;

    /// Return the full catalog index; may be served from cache
    async fn fetch_index(&self) -> Result<ResourceIndex>;

    /// Return a resource with content
    ///
    /// Fails with a not-found error when the (id, category) pair is absent.
    async fn fetch_resource(&self, id: &str, category: ResourceCategory) -> Result<Resource>;

    /// Scored keyword search over the catalog
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse>;

    /// Lightweight reachability plus success-rate summary
    async fn health_check(&self) -> Result<HealthRecord>;

    /// Counters since the last reset
    async fn stats(&self) -> Result<ProviderStats>;

    /// Zero all counters and restamp the reset time
    async fn reset_stats(&self) -> Result<()>;
}

/// Shared provider handle
pub type SharedResourceProvider = Arc<dyn ResourceProvider>;
