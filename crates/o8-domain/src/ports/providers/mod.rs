//! Provider ports

pub mod resource;

pub use resource::{ResourceProvider, SharedResourceProvider};
