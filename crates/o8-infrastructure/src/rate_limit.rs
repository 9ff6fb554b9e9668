//! Token-bucket rate limiter
//!
//! Two independent buckets per provider (per-minute and per-hour). A request
//! is admitted only when both buckets hold at least one token; on refusal
//! nothing is consumed and the error carries the milliseconds until the
//! empty bucket refills one unit.
//!
//! Refill is continuous: `tokens = min(capacity, tokens + elapsed_ms * rate)`
//! where `rate = capacity / period_ms`. The admission check is short and
//! non-suspending; no I/O happens under the lock.

use o8_domain::error::{Error, Result};
use o8_domain::value_objects::RateLimitSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Instant;

const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 3_600_000;

/// Requests admitted per period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Capacity of the per-minute bucket
    pub per_minute: u32,
    /// Capacity of the per-hour bucket
    pub per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 30,
            per_hour: 1000,
        }
    }
}

/// A single token bucket
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    last_refill: Instant,
    refill_per_ms: f64,
}

impl TokenBucket {
    fn new(capacity: u32, period_ms: u64, now: Instant) -> Self {
        let capacity = f64::from(capacity);
        Self {
            tokens: capacity,
            capacity,
            last_refill: now,
            refill_per_ms: capacity / period_ms as f64,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed_ms = now.duration_since(self.last_refill).as_millis() as f64;
        self.tokens = (self.tokens + elapsed_ms * self.refill_per_ms).min(self.capacity);
        self.last_refill = now;
    }

    /// Milliseconds until this bucket holds one full token
    fn ms_until_one(&self) -> u64 {
        if self.tokens >= 1.0 {
            return 0;
        }
        if self.refill_per_ms <= 0.0 {
            return u64::MAX;
        }
        ((1.0 - self.tokens) / self.refill_per_ms).ceil() as u64
    }
}

/// Dual-bucket rate limiter for one provider
#[derive(Debug)]
pub struct RateLimiter {
    provider: String,
    buckets: Mutex<(TokenBucket, TokenBucket)>,
}

impl RateLimiter {
    /// Create a limiter for a provider
    pub fn new<S: Into<String>>(provider: S, config: RateLimitConfig) -> Self {
        let now = Instant::now();
        Self {
            provider: provider.into(),
            buckets: Mutex::new((
                TokenBucket::new(config.per_minute, MINUTE_MS, now),
                TokenBucket::new(config.per_hour, HOUR_MS, now),
            )),
        }
    }

    /// Admit one request or fail with a rate-limit error
    ///
    /// On refusal neither bucket is consumed.
    pub fn try_acquire(&self) -> Result<()> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        let (minute, hour) = &mut *buckets;
        minute.refill(now);
        hour.refill(now);

        if minute.tokens < 1.0 {
            return Err(Error::rate_limit(&self.provider, minute.ms_until_one()));
        }
        if hour.tokens < 1.0 {
            return Err(Error::rate_limit(&self.provider, hour.ms_until_one()));
        }

        minute.tokens -= 1.0;
        hour.tokens -= 1.0;
        Ok(())
    }

    /// Point-in-time view of both buckets
    pub fn snapshot(&self) -> RateLimitSnapshot {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap();
        let (minute, hour) = &mut *buckets;
        minute.refill(now);
        hour.refill(now);
        RateLimitSnapshot {
            minute_remaining: minute.tokens,
            minute_capacity: minute.capacity,
            hour_remaining: hour.tokens,
            hour_capacity: hour.capacity,
        }
    }
}
