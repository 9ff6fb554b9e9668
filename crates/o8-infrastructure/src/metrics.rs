//! Per-provider statistics recorder
//!
//! Every provider owns one recorder and feeds it from all of its operations.
//! Counters are atomics; the response-time window is a bounded ring buffer
//! under a short lock. The invariant `total == success + failed + cached`
//! holds because every record method bumps `total` exactly once.

use chrono::{DateTime, Utc};
use o8_domain::constants::RESPONSE_TIME_WINDOW;
use o8_domain::value_objects::{HealthMetrics, ProviderStats, RateLimitSnapshot};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct TimeMarks {
    last_success: Option<DateTime<Utc>>,
    last_error: Option<Instant>,
    since: Option<DateTime<Utc>>,
}

/// Statistics recorder for one provider
#[derive(Debug)]
pub struct StatsRecorder {
    provider: String,
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    cached: AtomicU64,
    resources_fetched: AtomicU64,
    tokens_fetched: AtomicU64,
    bytes_downloaded: AtomicU64,
    consecutive_failures: AtomicU32,
    response_times: Mutex<VecDeque<u64>>,
    marks: Mutex<TimeMarks>,
}

impl StatsRecorder {
    /// Create a recorder for a provider
    pub fn new<S: Into<String>>(provider: S) -> Self {
        Self {
            provider: provider.into(),
            total: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            cached: AtomicU64::new(0),
            resources_fetched: AtomicU64::new(0),
            tokens_fetched: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            response_times: Mutex::new(VecDeque::with_capacity(RESPONSE_TIME_WINDOW)),
            marks: Mutex::new(TimeMarks {
                since: Some(Utc::now()),
                ..TimeMarks::default()
            }),
        }
    }

    /// Record a successful backend request and its response time
    pub fn record_success(&self, elapsed_ms: u64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.successful.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);

        let mut times = self.response_times.lock().unwrap();
        if times.len() == RESPONSE_TIME_WINDOW {
            times.pop_front();
        }
        times.push_back(elapsed_ms);
        drop(times);

        self.marks.lock().unwrap().last_success = Some(Utc::now());
    }

    /// Record a failed backend request
    pub fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        self.marks.lock().unwrap().last_error = Some(Instant::now());
    }

    /// Record a request served from cache
    pub fn record_cached(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.cached.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a not-found outcome
    ///
    /// Counts as a failed request but leaves the consecutive-failure streak
    /// and the recent-error mark alone: the backend answered, the resource
    /// just does not exist.
    pub fn record_not_found(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a full resource fetch and its token weight
    pub fn record_resource(&self, tokens: u32) {
        self.resources_fetched.fetch_add(1, Ordering::Relaxed);
        self.tokens_fetched
            .fetch_add(u64::from(tokens), Ordering::Relaxed);
    }

    /// Record downloaded bytes
    pub fn record_bytes(&self, bytes: u64) {
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Rolling average response time in milliseconds
    pub fn avg_response_time_ms(&self) -> f64 {
        let times = self.response_times.lock().unwrap();
        if times.is_empty() {
            return 0.0;
        }
        times.iter().sum::<u64>() as f64 / times.len() as f64
    }

    /// successful / (successful + failed); 1.0 before any backend call
    pub fn success_rate(&self) -> f64 {
        let successful = self.successful.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let backend_total = successful + failed;
        if backend_total == 0 {
            return 1.0;
        }
        successful as f64 / backend_total as f64
    }

    /// Failures since the last success
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Timestamp of the last successful request
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.marks.lock().unwrap().last_success
    }

    /// True when a failure happened within the window
    pub fn recent_error_within(&self, window: Duration) -> bool {
        self.marks
            .lock()
            .unwrap()
            .last_error
            .is_some_and(|at| at.elapsed() < window)
    }

    /// Health-record metrics summary
    pub fn health_metrics(&self) -> HealthMetrics {
        HealthMetrics {
            success_rate: self.success_rate(),
            avg_response_time_ms: self.avg_response_time_ms(),
            consecutive_failures: self.consecutive_failures(),
            last_success: self.last_success(),
        }
    }

    /// Full stats snapshot, with an optional rate-bucket view attached
    pub fn snapshot(&self, rate_limit: Option<RateLimitSnapshot>) -> ProviderStats {
        let total = self.total.load(Ordering::Relaxed);
        let cached = self.cached.load(Ordering::Relaxed);
        ProviderStats {
            provider: self.provider.clone(),
            total_requests: total,
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            cached_requests: cached,
            resources_fetched: self.resources_fetched.load(Ordering::Relaxed),
            tokens_fetched: self.tokens_fetched.load(Ordering::Relaxed),
            avg_response_time_ms: self.avg_response_time_ms(),
            cache_hit_rate: if total == 0 {
                0.0
            } else {
                cached as f64 / total as f64
            },
            uptime_ratio: self.success_rate(),
            rate_limit,
            since: self
                .marks
                .lock()
                .unwrap()
                .since
                .unwrap_or_else(Utc::now),
        }
    }

    /// Zero every counter and restamp the reset time
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.successful.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.cached.store(0, Ordering::Relaxed);
        self.resources_fetched.store(0, Ordering::Relaxed);
        self.tokens_fetched.store(0, Ordering::Relaxed);
        self.bytes_downloaded.store(0, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.response_times.lock().unwrap().clear();
        let mut marks = self.marks.lock().unwrap();
        marks.last_success = None;
        marks.last_error = None;
        marks.since = Some(Utc::now());
    }
}
