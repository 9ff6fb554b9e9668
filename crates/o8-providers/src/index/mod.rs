//! Inverted-index building and loading

pub mod builder;

pub use builder::{BuiltIndex, IndexBuilder};
