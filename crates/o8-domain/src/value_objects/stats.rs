//! Provider statistics records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a provider's rate buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RateLimitSnapshot {
    /// Tokens remaining in the per-minute bucket
    pub minute_remaining: f64,
    /// Capacity of the per-minute bucket
    pub minute_capacity: f64,
    /// Tokens remaining in the per-hour bucket
    pub hour_remaining: f64,
    /// Capacity of the per-hour bucket
    pub hour_capacity: f64,
}

/// Per-provider counters since the last reset
///
/// Invariant: `total_requests == successful_requests + failed_requests +
/// cached_requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    /// Provider label
    pub provider: String,
    /// All requests, including cache hits
    pub total_requests: u64,
    /// Requests that reached the backend and succeeded
    pub successful_requests: u64,
    /// Requests that failed
    pub failed_requests: u64,
    /// Requests served from cache
    pub cached_requests: u64,
    /// Full resources fetched
    pub resources_fetched: u64,
    /// Estimated tokens across fetched resources
    pub tokens_fetched: u64,
    /// Rolling average response time in milliseconds
    pub avg_response_time_ms: f64,
    /// cached / total (0.0 when no requests yet)
    pub cache_hit_rate: f64,
    /// successful / (successful + failed) (1.0 when no backend calls yet)
    pub uptime_ratio: f64,
    /// Rate-bucket snapshot, for rate-limited providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitSnapshot>,
    /// When counters were last reset
    pub since: DateTime<Utc>,
}

impl ProviderStats {
    /// Zeroed counters for a provider
    pub fn zeroed<S: Into<String>>(provider: S) -> Self {
        Self {
            provider: provider.into(),
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            cached_requests: 0,
            resources_fetched: 0,
            tokens_fetched: 0,
            avg_response_time_ms: 0.0,
            cache_hit_rate: 0.0,
            uptime_ratio: 1.0,
            rate_limit: None,
            since: Utc::now(),
        }
    }
}
