//! Configuration types

use crate::rate_limit::RateLimitConfig;
use o8_application::use_cases::registry::RegistryConfig;
use o8_domain::constants::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local filesystem provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalProviderConfig {
    /// Root of the resource tree (one subdirectory per category)
    pub resources_path: PathBuf,

    /// Resource cache capacity
    pub cache_size: usize,

    /// Resource cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Index cache TTL in seconds
    pub index_cache_ttl_secs: u64,

    /// Whether the resource cache is used at all
    pub enable_cache: bool,
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            resources_path: PathBuf::from("resources"),
            cache_size: LOCAL_CACHE_SIZE,
            cache_ttl_secs: LOCAL_CACHE_TTL_SECS,
            index_cache_ttl_secs: LOCAL_INDEX_TTL_SECS,
            enable_cache: true,
        }
    }
}

/// Community-catalog provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogProviderConfig {
    /// Whether the provider is constructed at all
    pub enabled: bool,

    /// Catalog endpoint serving the component JSON
    pub api_url: String,

    /// Index cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Restrict the catalog to these categories (empty = all)
    pub categories: Vec<String>,

    /// Outbound rate limits
    pub rate_limit: RateLimitConfig,

    /// Request deadline in seconds
    pub timeout_secs: u64,

    /// Retry attempts for transient failures
    pub retry_attempts: u32,

    /// Whether response caching is used at all
    pub enable_cache: bool,
}

impl Default for CatalogProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://catalog.o8.dev/components.json".to_string(),
            cache_ttl_secs: HTTP_INDEX_TTL_SECS,
            categories: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            timeout_secs: HTTP_TIMEOUT_SECS,
            retry_attempts: HTTP_RETRY_ATTEMPTS,
            enable_cache: true,
        }
    }
}

/// Authentication for source-control backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token value
    pub token: String,

    /// Token type (only "bearer" is recognized today)
    pub auth_type: String,
}

/// Source-control provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceControlProviderConfig {
    /// Whether the provider is constructed at all
    pub enabled: bool,

    /// Repositories to aggregate, as `owner/repo`
    pub repos: Vec<String>,

    /// Branch to read from
    pub branch: String,

    /// API endpoint for tree listings (override for enterprise hosts)
    pub api_base_url: String,

    /// Raw-content endpoint (override for enterprise hosts)
    pub raw_base_url: String,

    /// Index cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Optional API token
    pub auth: Option<AuthConfig>,

    /// Outbound rate limits
    pub rate_limit: RateLimitConfig,

    /// Request deadline in seconds
    pub timeout_secs: u64,

    /// Retry attempts for transient failures
    pub retry_attempts: u32,
}

impl Default for SourceControlProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repos: Vec::new(),
            branch: "main".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            cache_ttl_secs: HTTP_INDEX_TTL_SECS,
            auth: None,
            rate_limit: RateLimitConfig::default(),
            timeout_secs: HTTP_TIMEOUT_SECS,
            retry_attempts: HTTP_RETRY_ATTEMPTS,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Registry behavior
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Local provider; absent means no local provider is constructed
    #[serde(default)]
    pub local: Option<LocalProviderConfig>,

    /// Community-catalog provider
    #[serde(default)]
    pub catalog: Option<CatalogProviderConfig>,

    /// Source-control provider
    #[serde(default)]
    pub source_control: Option<SourceControlProviderConfig>,
}

impl AppConfig {
    /// Validate cross-field constraints
    pub fn validate(&self) -> o8_domain::Result<()> {
        if self.registry.uri_scheme.is_empty() {
            return Err(o8_domain::Error::config("uri_scheme must not be empty"));
        }
        if self.registry.enable_health_checks && self.registry.health_check_interval_ms == 0 {
            return Err(o8_domain::Error::config(
                "health_check_interval_ms must be positive when health checks are enabled",
            ));
        }
        if let Some(catalog) = &self.catalog {
            if catalog.enabled && catalog.api_url.is_empty() {
                return Err(o8_domain::Error::config("catalog api_url must not be empty"));
            }
        }
        if let Some(sc) = &self.source_control {
            if sc.enabled && sc.repos.is_empty() {
                return Err(o8_domain::Error::config(
                    "source_control requires at least one repo when enabled",
                ));
            }
            for repo in &sc.repos {
                if repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
                    return Err(o8_domain::Error::config(format!(
                        "repo '{repo}' must be owner/repo"
                    )));
                }
            }
        }
        Ok(())
    }
}
