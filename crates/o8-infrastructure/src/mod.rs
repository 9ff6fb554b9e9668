//! Infrastructure layer for O8
//!
//! Concrete machinery behind the provider federation: the bounded LRU cache
//! with per-entry TTL, the dual token-bucket rate limiter, the retrying HTTP
//! client, the tokio event bus, configuration types with their loader, and
//! the per-provider stats recorder.

pub mod cache;
pub mod config;
pub mod events;
pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod utils;

pub use cache::{IndexCache, TtlCache};
pub use events::TokioEventBus;
pub use http::{FetchOutcome, FetchOptions, FetchedResponse, HttpClientConfig, RetryingClient};
pub use metrics::StatsRecorder;
pub use rate_limit::{RateLimitConfig, RateLimiter};
