//! Domain layer for O8
//!
//! Core business types for federated resource discovery: the resource model,
//! catalog snapshots, the provider contract, the error taxonomy, and the pure
//! text utilities (preamble parsing, keyword extraction, edit distance) that
//! the scoring pipeline is built on.
//!
//! This crate has no I/O and no dependency on other workspace crates.

pub mod constants;
pub mod entities;
pub mod error;
pub mod events;
pub mod ports;
pub mod utils;
pub mod value_objects;

pub use entities::{Resource, ResourceCategory, ResourceFragment, ResourceMetadata};
pub use error::{Error, Result};
pub use events::{ProviderEvent, ProviderEventKind};
pub use ports::providers::{ResourceProvider, SharedResourceProvider};
pub use value_objects::{
    HealthRecord, HealthStatus, MatchMode, ProviderStats, ResourceIndex, ResourceUri,
    SearchOptions, SearchResponse, SearchResult,
};
