//! Provider health records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with elevated error rates or a recent failure
    Degraded,
    /// Not operational
    Unhealthy,
    /// No check has completed yet
    #[default]
    Unknown,
}

impl HealthStatus {
    /// True when the provider should receive traffic
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }
}

/// Success-rate summary attached to a health record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HealthMetrics {
    /// Fraction of non-cached requests that succeeded
    pub success_rate: f64,
    /// Rolling average response time in milliseconds
    pub avg_response_time_ms: f64,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Timestamp of the last successful request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
}

/// Result of a provider health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Provider label
    pub provider: String,
    /// Current status
    pub status: HealthStatus,
    /// When the check ran
    pub checked_at: DateTime<Utc>,
    /// How long the check took, in milliseconds
    pub response_time_ms: u64,
    /// Whether the backend was reachable
    pub reachable: bool,
    /// Whether credentials (if configured) were accepted
    pub authenticated: bool,
    /// Error from the check, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Success-rate summary
    pub metrics: HealthMetrics,
}

impl HealthRecord {
    /// A healthy record with empty metrics
    pub fn healthy<S: Into<String>>(provider: S) -> Self {
        Self {
            provider: provider.into(),
            status: HealthStatus::Healthy,
            checked_at: Utc::now(),
            response_time_ms: 0,
            reachable: true,
            authenticated: true,
            error: None,
            metrics: HealthMetrics::default(),
        }
    }

    /// An unhealthy record carrying an error
    pub fn unhealthy<S: Into<String>, E: Into<String>>(provider: S, error: E) -> Self {
        Self {
            provider: provider.into(),
            status: HealthStatus::Unhealthy,
            checked_at: Utc::now(),
            response_time_ms: 0,
            reachable: false,
            authenticated: false,
            error: Some(error.into()),
            metrics: HealthMetrics::default(),
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: HealthStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the response time
    pub fn with_response_time_ms(mut self, ms: u64) -> Self {
        self.response_time_ms = ms;
        self
    }

    /// Attach metrics
    pub fn with_metrics(mut self, metrics: HealthMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}
