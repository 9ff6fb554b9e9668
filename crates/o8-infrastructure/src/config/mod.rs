//! Configuration
//!
//! Serde-typed provider configuration plus a figment-based loader that
//! merges defaults, a TOML file, and `O8_`-prefixed environment variables.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use o8_application::use_cases::registry::RegistryConfig;
pub use types::{
    AppConfig, AuthConfig, CatalogProviderConfig, LocalProviderConfig,
    SourceControlProviderConfig,
};
