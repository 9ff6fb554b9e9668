//! Tokio broadcast event bus
//!
//! In-process event distribution for provider lifecycle events. Each
//! subscriber gets a bounded buffer; when a slow subscriber falls behind the
//! oldest events are dropped and a warning is logged, so publishing never
//! blocks the registry.

use async_trait::async_trait;
use futures::stream;
use o8_domain::error::Result;
use o8_domain::events::{EventPublisher, ProviderEvent, ProviderEventStream};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default per-subscriber buffer capacity
const DEFAULT_CAPACITY: usize = 1024;

/// Event bus over a tokio broadcast channel
///
/// Events are ephemeral: subscribers only see events published after they
/// subscribed, and nothing is persisted.
#[derive(Clone)]
pub struct TokioEventBus {
    sender: Arc<broadcast::Sender<ProviderEvent>>,
    capacity: usize,
}

impl TokioEventBus {
    /// Create a bus with the default buffer capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create with a custom per-subscriber buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
            capacity,
        }
    }

    /// Create as Arc for sharing
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TokioEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokioEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioEventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for TokioEventBus {
    async fn publish(&self, event: ProviderEvent) -> Result<()> {
        match self.sender.send(event) {
            Ok(count) => debug!("published event to {count} subscribers"),
            Err(_) => debug!("published event but no subscribers"),
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<ProviderEventStream> {
        let receiver = self.sender.subscribe();

        // Convert the broadcast receiver into a stream; lagged subscribers
        // lose the oldest events rather than stalling the publisher.
        let stream = stream::unfold(receiver, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("event subscriber lagged by {n} events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(Box::pin(stream))
    }

    fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}
