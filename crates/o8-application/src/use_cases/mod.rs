//! Use cases

pub mod registry;

pub use registry::{
    ProviderInfo, ProviderRegistry, ProviderState, RegistryConfig, ResourceResolution,
};
