//! Community-catalog provider
//!
//! One monolithic JSON endpoint serves the whole catalog; individual
//! resources resolve from the in-memory component list plus a preamble
//! parse. All outbound traffic is admitted through the dual rate buckets
//! and cached under the index/resource split of the caching layer.

use crate::catalog::shapes::{category_for_type, CatalogDocument, RawComponent};
use crate::document::resource_from_content;
use crate::scoring::{score_component, ComponentSignals};
use async_trait::async_trait;
use o8_domain::constants::{
    CATALOG_PRIORITY, HEALTHY_SUCCESS_RATE, HTTP_RESOURCE_CACHE_SIZE, HTTP_RESOURCE_TTL_SECS,
};
use o8_domain::entities::{estimate_tokens, Resource, ResourceCategory, ResourceMetadata};
use o8_domain::error::{Error, Result};
use o8_domain::ports::providers::ResourceProvider;
use o8_domain::utils::frontmatter::parse_document;
use o8_domain::utils::keywords::extract_keywords;
use o8_domain::value_objects::{
    HealthRecord, HealthStatus, ProviderStats, ResourceIndex, SearchFacets, SearchOptions,
    SearchResponse, SearchResult,
};
use o8_infrastructure::config::CatalogProviderConfig;
use o8_infrastructure::utils::TimedOperation;
use o8_infrastructure::{
    FetchOptions, FetchOutcome, HttpClientConfig, IndexCache, RateLimiter, RetryingClient,
    StatsRecorder, TtlCache,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Label of the community-catalog provider
pub const CATALOG_PROVIDER_LABEL: &str = "community-catalog";

/// Failure streak at which the provider reports unhealthy
const UNHEALTHY_FAILURE_STREAK: u32 = 3;

/// One catalog component, indexed
struct CatalogEntry {
    metadata: ResourceMetadata,
    content: String,
    signals: ComponentSignals,
}

struct CatalogInner {
    config: CatalogProviderConfig,
    enabled: AtomicBool,
    stats: StatsRecorder,
    limiter: RateLimiter,
    client: RetryingClient,
    index_cache: IndexCache<ResourceIndex>,
    entries: std::sync::Mutex<Arc<Vec<CatalogEntry>>>,
    resource_cache: TtlCache<String, Resource>,
    load_lock: tokio::sync::Mutex<()>,
}

/// HTTP provider over a community component catalog
pub struct CatalogProvider {
    inner: Arc<CatalogInner>,
}

impl CatalogProvider {
    /// Create a provider from configuration
    pub fn new(config: CatalogProviderConfig) -> Result<Self> {
        let client = RetryingClient::new(
            CATALOG_PROVIDER_LABEL,
            HttpClientConfig::new(
                Duration::from_secs(config.timeout_secs),
                config.retry_attempts,
            ),
        )?;
        // A zero TTL disables caching: every entry is immediately stale
        let index_ttl = if config.enable_cache {
            Duration::from_secs(config.cache_ttl_secs)
        } else {
            Duration::from_secs(0)
        };
        let resource_capacity = if config.enable_cache {
            HTTP_RESOURCE_CACHE_SIZE
        } else {
            0
        };
        Ok(Self {
            inner: Arc::new(CatalogInner {
                limiter: RateLimiter::new(CATALOG_PROVIDER_LABEL, config.rate_limit),
                client,
                index_cache: IndexCache::new(index_ttl),
                entries: std::sync::Mutex::new(Arc::new(Vec::new())),
                resource_cache: TtlCache::new(
                    resource_capacity,
                    Duration::from_secs(HTTP_RESOURCE_TTL_SECS),
                ),
                stats: StatsRecorder::new(CATALOG_PROVIDER_LABEL),
                enabled: AtomicBool::new(config.enabled),
                load_lock: tokio::sync::Mutex::new(()),
                config,
            }),
        })
    }

    fn entries(&self) -> Arc<Vec<CatalogEntry>> {
        Arc::clone(&self.inner.entries.lock().unwrap())
    }

    async fn load_index(&self) -> Result<ResourceIndex> {
        let inner = &self.inner;
        let _guard = inner.load_lock.lock().await;

        if let Some(index) = inner.index_cache.get() {
            inner.stats.record_cached();
            return Ok(index);
        }

        let timer = TimedOperation::start();
        inner.limiter.try_acquire()?;

        let etag = inner.index_cache.get_stale().and_then(|(_, etag)| etag);
        let options = FetchOptions {
            etag,
            bearer_token: None,
        };

        let outcome = match inner.client.get(&inner.config.api_url, &options).await {
            Ok(outcome) => outcome,
            Err(error) => {
                inner.stats.record_failure();
                return Err(error);
            }
        };

        match outcome {
            FetchOutcome::NotModified => {
                // Our cached version is still what the origin serves
                inner.index_cache.revalidate();
                let (index, _) = inner
                    .index_cache
                    .get_stale()
                    .ok_or_else(|| Error::provider(CATALOG_PROVIDER_LABEL, "304 with no cache"))?;
                inner.stats.record_success(timer.elapsed_ms());
                Ok(index)
            }
            FetchOutcome::Fetched(response) => {
                inner.stats.record_bytes(response.bytes);
                let value: serde_json::Value = serde_json::from_str(&response.body)
                    .map_err(|e| {
                        inner.stats.record_failure();
                        Error::provider(
                            CATALOG_PROVIDER_LABEL,
                            format!("catalog body is not JSON: {e}"),
                        )
                    })?;
                let components = match CatalogDocument::from_value(value) {
                    Ok(document) => document.into_components(),
                    Err(error) => {
                        inner.stats.record_failure();
                        return Err(error);
                    }
                };

                let entries = build_entries(&components, &inner.config);
                let metadata: Vec<ResourceMetadata> =
                    entries.iter().map(|e| e.metadata.clone()).collect();
                let index = ResourceIndex::from_resources(
                    CATALOG_PROVIDER_LABEL,
                    env!("CARGO_PKG_VERSION"),
                    metadata,
                    20,
                );

                inner.index_cache.set(index.clone(), response.etag);
                *inner.entries.lock().unwrap() = Arc::new(entries);
                inner.stats.record_success(timer.elapsed_ms());

                info!(total = index.total, "community catalog fetched");
                Ok(index)
            }
        }
    }
}

/// Map raw components to indexed entries, applying the category filter
fn build_entries(components: &[RawComponent], config: &CatalogProviderConfig) -> Vec<CatalogEntry> {
    components
        .iter()
        .filter_map(|component| {
            let category = category_for_type(&component.component_type);
            if !config.categories.is_empty()
                && !config
                    .categories
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(category.as_str()))
            {
                return None;
            }

            let doc = parse_document(&component.content);
            let preamble = &doc.preamble;

            let mut tags: Vec<String> =
                component.tags.iter().map(|t| t.to_lowercase()).collect();
            for tag in preamble.string_list("tags") {
                let tag = tag.to_lowercase();
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }

            let estimated_tokens = preamble
                .positive_int("estimatedTokens")
                .unwrap_or_else(|| estimate_tokens(&doc.body));

            let metadata = ResourceMetadata {
                id: component.name.clone(),
                category,
                title: component
                    .title
                    .clone()
                    .or_else(|| preamble.scalar("title").map(str::to_string))
                    .unwrap_or_else(|| component.name.clone()),
                description: component
                    .description
                    .clone()
                    .or_else(|| preamble.scalar("description").map(str::to_string))
                    .unwrap_or_default(),
                tags,
                capabilities: preamble.string_list("capabilities"),
                use_when: preamble.string_list("useWhen"),
                estimated_tokens,
                version: preamble.scalar("version").map(str::to_string),
                author: preamble.scalar("author").map(str::to_string),
                created_at: preamble.timestamp("createdAt"),
                updated_at: preamble.timestamp("updatedAt"),
                source: CATALOG_PROVIDER_LABEL.to_string(),
                source_uri: format!("component:{}", component.name),
            };

            let signals = ComponentSignals {
                downloads: component.downloads,
                validation_score: component
                    .validation
                    .as_ref()
                    .filter(|v| v.valid)
                    .map(|v| v.score),
            };

            Some(CatalogEntry {
                metadata,
                content: component.content.clone(),
                signals,
            })
        })
        .collect()
}

#[async_trait]
impl ResourceProvider for CatalogProvider {
    fn label(&self) -> &str {
        CATALOG_PROVIDER_LABEL
    }

    fn priority(&self) -> i32 {
        CATALOG_PRIORITY
    }

    fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    async fn initialize(&self) -> Result<()> {
        if self.inner.config.api_url.is_empty() {
            return Err(Error::config("catalog api_url must not be empty"));
        }
        debug!(url = %self.inner.config.api_url, "community catalog configured");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.inner.index_cache.clear();
        self.inner.resource_cache.clear();
        *self.inner.entries.lock().unwrap() = Arc::new(Vec::new());
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

        // The whole component list is in memory; make sure it is loaded
        if self.entries().is_empty() {
            self.load_index().await?;
        }

        let entries = self.entries();
        let Some(entry) = entries
            .iter()
            .find(|e| e.metadata.id == id && e.metadata.category == category)
        else {
            self.inner.stats.record_not_found();
            return Err(Error::not_found(
                CATALOG_PROVIDER_LABEL,
                format!("{}/{id}", category.as_str()),
            ));
        };

        let resource = resource_from_content(
            &entry.content,
            id,
            category,
            CATALOG_PROVIDER_LABEL,
            &entry.metadata.source_uri,
        );

        self.inner.stats.record_cached();
        self.inner.stats.record_resource(resource.estimated_tokens);
        self.inner.resource_cache.insert(key, resource.clone());
        Ok(resource)
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        self.fetch_index().await?;
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            return Ok(SearchResponse::empty());
        }

        let entries = self.entries();
        let mut results: Vec<SearchResult> = entries
            .iter()
            .filter_map(|entry| {
                let (score, match_reasons) =
                    score_component(&entry.metadata, entry.signals, &keywords, options)?;
                if score < options.min_score {
                    return None;
                }
                Some(SearchResult {
                    resource: entry.metadata.clone(),
                    score,
                    provider: CATALOG_PROVIDER_LABEL.to_string(),
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

        debug!(query, total, returned = results.len(), "catalog search complete");
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
                    provider: CATALOG_PROVIDER_LABEL.to_string(),
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
                provider: CATALOG_PROVIDER_LABEL.to_string(),
                status: HealthStatus::Unhealthy,
                checked_at: chrono::Utc::now(),
                response_time_ms: timer.elapsed_ms(),
                reachable: false,
                authenticated: !matches!(error, Error::AuthFailed { .. }),
                error: Some(error.to_string()),
                metrics,
            },
        };

        if record.status != HealthStatus::Healthy {
            warn!(status = ?record.status, "community catalog health degraded");
        }
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
