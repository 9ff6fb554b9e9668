//! Domain ports
//!
//! Contracts implemented outside the domain crate. Provider backends
//! implement [`providers::ResourceProvider`]; the event bus implements
//! [`crate::events::EventPublisher`].

pub mod providers;
