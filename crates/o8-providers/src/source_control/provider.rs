//! Source-control provider
//!
//! Aggregates one or more remote repositories: each repository's branch tree
//! is listed once, paths are classified into categories, and individual
//! resources are fetched from their raw-content URLs on demand.

use crate::document::resource_from_content;
use crate::scoring::{score_component, ComponentSignals};
use crate::source_control::repo_map::classify_path;
use async_trait::async_trait;
use o8_domain::constants::{
    HEALTHY_SUCCESS_RATE, HTTP_RESOURCE_CACHE_SIZE, HTTP_RESOURCE_TTL_SECS,
    SOURCE_CONTROL_PRIORITY,
};
use o8_domain::entities::{Resource, ResourceCategory, ResourceMetadata};
use o8_domain::error::{Error, Result};
use o8_domain::ports::providers::ResourceProvider;
use o8_domain::utils::keywords::extract_keywords;
use o8_domain::value_objects::{
    HealthRecord, HealthStatus, ProviderStats, ResourceIndex, SearchFacets, SearchOptions,
    SearchResponse, SearchResult,
};
use o8_infrastructure::config::SourceControlProviderConfig;
use o8_infrastructure::utils::TimedOperation;
use o8_infrastructure::{
    FetchOptions, FetchOutcome, HttpClientConfig, IndexCache, RateLimiter, RetryingClient,
    StatsRecorder, TtlCache,
};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Label of the source-control provider
pub const SOURCE_CONTROL_PROVIDER_LABEL: &str = "source-control";

/// Failure streak at which the provider reports unhealthy
const UNHEALTHY_FAILURE_STREAK: u32 = 3;

/// Tree-listing response shape
#[derive(Debug, Deserialize)]
struct TreeListing {
    tree: Vec<TreeNode>,
}

/// One node of a repository tree listing
#[derive(Debug, Deserialize)]
struct TreeNode {
    path: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    size: Option<u64>,
}

struct SourceControlInner {
    config: SourceControlProviderConfig,
    enabled: AtomicBool,
    stats: StatsRecorder,
    limiter: RateLimiter,
    client: RetryingClient,
    index_cache: IndexCache<ResourceIndex>,
    resource_cache: TtlCache<String, Resource>,
    load_lock: tokio::sync::Mutex<()>,
}

/// HTTP provider over source-control repositories
pub struct SourceControlProvider {
    inner: Arc<SourceControlInner>,
}

impl SourceControlProvider {
    /// Create a provider from configuration
    pub fn new(config: SourceControlProviderConfig) -> Result<Self> {
        let client = RetryingClient::new(
            SOURCE_CONTROL_PROVIDER_LABEL,
            HttpClientConfig::new(
                Duration::from_secs(config.timeout_secs),
                config.retry_attempts,
            ),
        )?;
        Ok(Self {
            inner: Arc::new(SourceControlInner {
                limiter: RateLimiter::new(SOURCE_CONTROL_PROVIDER_LABEL, config.rate_limit),
                client,
                index_cache: IndexCache::new(Duration::from_secs(config.cache_ttl_secs)),
                resource_cache: TtlCache::new(
                    HTTP_RESOURCE_CACHE_SIZE,
                    Duration::from_secs(HTTP_RESOURCE_TTL_SECS),
                ),
                stats: StatsRecorder::new(SOURCE_CONTROL_PROVIDER_LABEL),
                enabled: AtomicBool::new(config.enabled),
                load_lock: tokio::sync::Mutex::new(()),
                config,
            }),
        })
    }

    fn bearer_token(&self) -> Option<String> {
        self.inner
            .config
            .auth
            .as_ref()
            .filter(|auth| auth.auth_type.eq_ignore_ascii_case("bearer"))
            .map(|auth| auth.token.clone())
    }

    /// List one repository's tree and classify its files
    async fn index_repository(&self, repo: &str) -> Result<Vec<ResourceMetadata>> {
        let inner = &self.inner;
        inner.limiter.try_acquire()?;

        let url = format!(
            "{}/repos/{repo}/git/trees/{}?recursive=1",
            inner.config.api_base_url, inner.config.branch
        );
        let options = FetchOptions {
            etag: None,
            bearer_token: self.bearer_token(),
        };

        let response = match inner.client.get(&url, &options).await? {
            FetchOutcome::Fetched(response) => response,
            FetchOutcome::NotModified => {
                return Err(Error::provider(
                    SOURCE_CONTROL_PROVIDER_LABEL,
                    "unexpected 304 without a conditional request",
                ));
            }
        };
        inner.stats.record_bytes(response.bytes);

        let listing: TreeListing = serde_json::from_str(&response.body).map_err(|e| {
            Error::provider(
                SOURCE_CONTROL_PROVIDER_LABEL,
                format!("tree listing parse failed for {repo}: {e}"),
            )
        })?;

        let mut entries = Vec::new();
        for node in listing.tree {
            if node.node_type != "blob" || !node.path.ends_with(".md") {
                continue;
            }
            let Some(category) = classify_path(repo, &node.path) else {
                continue;
            };
            let stem = node
                .path
                .rsplit('/')
                .next()
                .and_then(|name| name.strip_suffix(".md"))
                .unwrap_or_default();
            if stem.is_empty() {
                continue;
            }

            let raw_url = format!(
                "{}/{repo}/{}/{}",
                inner.config.raw_base_url, inner.config.branch, node.path
            );
            entries.push(ResourceMetadata {
                id: stem.to_string(),
                category,
                title: stem.replace('-', " "),
                description: String::new(),
                tags: Vec::new(),
                capabilities: Vec::new(),
                use_when: Vec::new(),
                // The tree listing has sizes but no content
                estimated_tokens: node.size.map_or(1, |s| (s / 4).max(1) as u32),
                version: None,
                author: None,
                created_at: None,
                updated_at: None,
                source: SOURCE_CONTROL_PROVIDER_LABEL.to_string(),
                source_uri: raw_url,
            });
        }

        debug!(repo, count = entries.len(), "repository tree classified");
        Ok(entries)
    }

    async fn load_index(&self) -> Result<ResourceIndex> {
        let inner = &self.inner;
        let _guard = inner.load_lock.lock().await;

        if let Some(index) = inner.index_cache.get() {
            inner.stats.record_cached();
            return Ok(index);
        }

        let timer = TimedOperation::start();
        let mut merged: Vec<ResourceMetadata> = Vec::new();
        let mut first_error: Option<Error> = None;
        let mut succeeded = 0usize;

        for repo in &inner.config.repos {
            match self.index_repository(repo).await {
                Ok(entries) => {
                    succeeded += 1;
                    merged.extend(entries);
                }
                Err(error) => {
                    warn!(repo, %error, "repository indexing failed");
                    first_error.get_or_insert(error);
                }
            }
        }

        if succeeded == 0 {
            inner.stats.record_failure();
            return Err(first_error.unwrap_or_else(|| {
                Error::unavailable(SOURCE_CONTROL_PROVIDER_LABEL, "no repositories configured")
            }));
        }

        let index = ResourceIndex::from_resources(
            SOURCE_CONTROL_PROVIDER_LABEL,
            env!("CARGO_PKG_VERSION"),
            merged,
            20,
        );
        inner.index_cache.set(index.clone(), None);
        inner.stats.record_success(timer.elapsed_ms());

        info!(
            repos = succeeded,
            total = index.total,
            "source-control index merged"
        );
        Ok(index)
    }
}

#[async_trait]
impl ResourceProvider for SourceControlProvider {
    fn label(&self) -> &str {
        SOURCE_CONTROL_PROVIDER_LABEL
    }

    fn priority(&self) -> i32 {
        SOURCE_CONTROL_PRIORITY
    }

    fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    async fn initialize(&self) -> Result<()> {
        if self.inner.config.repos.is_empty() {
            return Err(Error::config(
                "source-control provider requires at least one repository",
            ));
        }
        debug!(
            repos = self.inner.config.repos.len(),
            branch = %self.inner.config.branch,
            "source-control provider configured"
        );
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.inner.index_cache.clear();
        self.inner.resource_cache.clear();
        Ok(())
    }

    async fn fetch_index(&self) -> Result<ResourceIndex> {
        if let Some(index) = self.inner.index_cache.get() {
            self.inner.stats.record_cached();
            return Ok(index);
        }
        self.load_index().await
    }

    async fn fetch_resource(&self, id: &str, category: ResourceCategory) -> Result<Resource> {
        let key = format!("{}:{}", category.as_str(), id);
        if let Some(resource) = self.inner.resource_cache.get(&key) {
            self.inner.stats.record_cached();
            return Ok(resource);
        }

        let index = self.fetch_index().await?;
        let Some(metadata) = index.find(id, category) else {
            self.inner.stats.record_not_found();
            return Err(Error::not_found(
                SOURCE_CONTROL_PROVIDER_LABEL,
                format!("{}/{id}", category.as_str()),
            ));
        };

        let timer = TimedOperation::start();
        self.inner.limiter.try_acquire()?;
        let options = FetchOptions {
            etag: None,
            bearer_token: self.bearer_token(),
        };

        let response = match self.inner.client.get(&metadata.source_uri, &options).await {
            Ok(FetchOutcome::Fetched(response)) => response,
            Ok(FetchOutcome::NotModified) => {
                return Err(Error::provider(
                    SOURCE_CONTROL_PROVIDER_LABEL,
                    "unexpected 304 without a conditional request",
                ));
            }
            Err(error) => {
                if matches!(error, Error::NotFound { .. }) {
                    self.inner.stats.record_not_found();
                } else {
                    self.inner.stats.record_failure();
                }
                return Err(error);
            }
        };

        self.inner.stats.record_bytes(response.bytes);
        let resource = resource_from_content(
            &response.body,
            id,
            category,
            SOURCE_CONTROL_PROVIDER_LABEL,
            &metadata.source_uri,
        );

        self.inner.stats.record_success(timer.elapsed_ms());
        self.inner.stats.record_resource(resource.estimated_tokens);
        self.inner.resource_cache.insert(key, resource.clone());
        Ok(resource)
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        let index = self.fetch_index().await?;
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            return Ok(SearchResponse::empty());
        }

        let mut results: Vec<SearchResult> = index
            .resources
            .iter()
            .filter_map(|metadata| {
                let (score, match_reasons) = score_component(
                    metadata,
                    ComponentSignals::default(),
                    &keywords,
                    options,
                )?;
                if score < options.min_score {
                    return None;
                }
                Some(SearchResult {
                    resource: metadata.clone(),
                    score,
                    provider: SOURCE_CONTROL_PROVIDER_LABEL.to_string(),
                    match_reasons,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.resource.estimated_tokens.cmp(&b.resource.estimated_tokens))
                .then_with(|| a.resource.id.cmp(&b.resource.id))
        });

        let total = results.len();
        let facets = SearchFacets::compute(&results);
        results.truncate(options.max_results);

        Ok(SearchResponse {
            results,
            total,
            facets,
            provider_status: Default::default(),
        })
    }

    async fn health_check(&self) -> Result<HealthRecord> {
        let timer = TimedOperation::start();
        let result = self.fetch_index().await;
        let metrics = self.inner.stats.health_metrics();

        let record = match result {
            Ok(index) => {
                let status = if metrics.consecutive_failures >= UNHEALTHY_FAILURE_STREAK {
                    HealthStatus::Unhealthy
                } else if index.total == 0 || metrics.success_rate < HEALTHY_SUCCESS_RATE {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                };
                HealthRecord {
                    provider: SOURCE_CONTROL_PROVIDER_LABEL.to_string(),
                    status,
                    checked_at: chrono::Utc::now(),
                    response_time_ms: timer.elapsed_ms(),
                    reachable: true,
                    authenticated: true,
                    error: None,
                    metrics,
                }
            }
            Err(error) => HealthRecord {
                provider: SOURCE_CONTROL_PROVIDER_LABEL.to_string(),
                status: HealthStatus::Unhealthy,
                checked_at: chrono::Utc::now(),
                response_time_ms: timer.elapsed_ms(),
                reachable: false,
                authenticated: !matches!(error, Error::AuthFailed { .. }),
                error: Some(error.to_string()),
                metrics,
            },
        };

        Ok(record)
    }

    async fn stats(&self) -> Result<ProviderStats> {
        Ok(self
            .inner
            .stats
            .snapshot(Some(self.inner.limiter.snapshot())))
    }

    async fn reset_stats(&self) -> Result<()> {
        self.inner.stats.reset();
        Ok(())
    }
}
