//! Provider Event Port
//!
//! Defines the registry's event surface: the event record emitted on provider
//! lifecycle transitions and the publisher port that decouples the registry
//! from the concrete bus implementation.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

/// Kind of a provider lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderEventKind {
    /// Provider registered with the registry
    ProviderRegistered,
    /// Provider unregistered
    ProviderUnregistered,
    /// Provider enabled
    ProviderEnabled,
    /// Provider disabled (manual or auto)
    ProviderDisabled,
    /// Provider operation failed
    ProviderError,
    /// Provider health status changed
    HealthChanged,
}

/// A provider lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// Event kind
    #[serde(rename = "type")]
    pub kind: ProviderEventKind,
    /// Label of the provider the event concerns
    pub provider: String,
    /// Emission timestamp
    pub timestamp: DateTime<Utc>,
    /// Kind-specific payload (reason strings, health transitions, ...)
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ProviderEvent {
    /// Build an event stamped now
    pub fn new<S: Into<String>>(
        kind: ProviderEventKind,
        provider: S,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            provider: provider.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Stream of provider events delivered to one subscriber
pub type ProviderEventStream = Pin<Box<dyn Stream<Item = ProviderEvent> + Send>>;

/// Port for publishing and subscribing to provider events
///
/// Delivery is best-effort and FIFO per subscriber; a slow subscriber must
/// never block the publisher.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to all subscribers
    async fn publish(&self, event: ProviderEvent) -> Result<()>;

    /// Open a new subscription
    async fn subscribe(&self) -> Result<ProviderEventStream>;

    /// True if at least one subscriber is listening
    fn has_subscribers(&self) -> bool;
}

/// Shared event publisher handle
pub type SharedEventPublisher = Arc<dyn EventPublisher>;
