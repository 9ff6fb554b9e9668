//! # O8
//!
//! A federated resource-discovery hub. O8 aggregates structured text
//! artifacts (agents, skills, examples, patterns, workflows) from
//! heterogeneous backends - a local filesystem tree, a community HTTP
//! catalog, and source-control repositories - and exposes them through one
//! query surface: fetch-by-identity, catalog indexes, and ranked keyword
//! search with token-budgeted assembly.
//!
//! ## Example
//!
//! ```ignore
//! use o8::{RegistryBuilder, SearchOptions};
//! use o8::infrastructure::config::ConfigLoader;
//!
//! # async fn run() -> o8::Result<()> {
//! let config = ConfigLoader::new().with_config_path("o8.toml").load()?;
//! let registry = RegistryBuilder::from_config(config).build().await?;
//!
//! let response = registry
//!     .search_all("build typescript api", &SearchOptions::default(), &[])
//!     .await;
//! for result in &response.results {
//!     println!("{} ({}) via {}", result.resource.id, result.score, result.provider);
//! }
//!
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The workspace follows a layered split:
//!
//! - `domain` - resource model, provider ports, error taxonomy, text utils
//! - `application` - fuzzy matcher, tiered index lookup, provider registry
//! - `infrastructure` - caching, rate limiting, HTTP client, events, config
//! - `providers` - local filesystem, community catalog, source control

use std::sync::Arc;
use tracing::info;

/// Domain layer - resource model, ports, and errors
pub mod domain {
    pub use o8_domain::*;
}

/// Application layer - matching, lookup, and the registry
pub mod application {
    pub use o8_application::*;
}

/// Infrastructure layer - caches, rate limits, HTTP, events, config
pub mod infrastructure {
    pub use o8_infrastructure::*;
}

/// Provider layer - concrete backends and the index builder
pub mod providers {
    pub use o8_providers::*;
}

// Re-export the common working set at the crate root
pub use application::{
    LookupEngine, LookupOptions, LookupOutcome, MatchRequest, ProviderRegistry, RegistryConfig,
    ResourceMatcher, ResourceResolution,
};
pub use domain::{
    Error, HealthRecord, HealthStatus, MatchMode, ProviderStats, Resource, ResourceCategory,
    ResourceFragment, ResourceIndex, ResourceMetadata, ResourceUri, Result, SearchOptions,
    SearchResponse, SearchResult,
};
pub use infrastructure::config::{AppConfig, ConfigLoader};
pub use infrastructure::TokioEventBus;
pub use providers::{CatalogProvider, IndexBuilder, LocalProvider, SourceControlProvider};

/// Wires configuration into a running registry
///
/// Constructs the configured providers, registers them in priority order,
/// and starts health monitoring. The registry's lifetime stays explicit:
/// the caller owns it and is responsible for `shutdown()`.
pub struct RegistryBuilder {
    config: AppConfig,
    events: Option<Arc<TokioEventBus>>,
}

impl RegistryBuilder {
    /// Start from a loaded configuration
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config,
            events: None,
        }
    }

    /// Use a caller-provided event bus (for sharing with the transport)
    pub fn with_event_bus(mut self, events: Arc<TokioEventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the registry and register every configured provider
    pub async fn build(self) -> Result<ProviderRegistry> {
        self.config.validate()?;
        let events = self.events.unwrap_or_else(TokioEventBus::new_shared);
        let registry = ProviderRegistry::new(self.config.registry.clone(), events);

        if let Some(local) = self.config.local {
            registry.register(Arc::new(LocalProvider::new(local))).await?;
        }
        if let Some(catalog) = self.config.catalog {
            if catalog.enabled {
                registry
                    .register(Arc::new(CatalogProvider::new(catalog)?))
                    .await?;
            }
        }
        if let Some(source_control) = self.config.source_control {
            if source_control.enabled {
                registry
                    .register(Arc::new(SourceControlProvider::new(source_control)?))
                    .await?;
            }
        }

        registry.start();
        info!("registry built and started");
        Ok(registry)
    }
}
