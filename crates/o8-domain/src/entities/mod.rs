//! Domain entities

pub mod resource;

pub use resource::{
    estimate_tokens, Resource, ResourceCategory, ResourceFragment, ResourceMetadata,
};
