//! Provider lifecycle events

pub mod provider_events;

pub use provider_events::{
    EventPublisher, ProviderEvent, ProviderEventKind, ProviderEventStream, SharedEventPublisher,
};
