//! Local filesystem provider
//!
//! Serves resources from a directory tree with one subdirectory per
//! category. The index is built by scanning every category concurrently and
//! is cached under a long TTL; individual resources are read on demand and
//! cached in a bounded LRU. Concurrent index loads coalesce: a second caller
//! arriving mid-load awaits the first one's result.

use crate::local::loader::{scan_category, CATEGORY_DIRS, LOCAL_SOURCE};
use async_trait::async_trait;
use futures::future::join_all;
use o8_application::domain_services::matcher::{MatchRequest, ResourceMatcher};
use o8_domain::constants::{
    HEALTHY_SUCCESS_RATE, RECENT_ERROR_WINDOW_SECS, TOP_TAGS_LOCAL, UNHEALTHY_SUCCESS_RATE,
};
use o8_domain::entities::{Resource, ResourceCategory, ResourceFragment, ResourceMetadata};
use o8_domain::error::{Error, Result};
use o8_domain::ports::providers::ResourceProvider;
use o8_domain::utils::keywords::extract_keywords;
use o8_domain::value_objects::uri::MatchMode;
use o8_domain::value_objects::{
    HealthRecord, HealthStatus, ProviderStats, ResourceIndex, SearchFacets, SearchOptions,
    SearchResponse, SearchResult, SortBy, SortDirection,
};
use o8_infrastructure::config::LocalProviderConfig;
use o8_infrastructure::utils::TimedOperation;
use o8_infrastructure::{IndexCache, StatsRecorder, TtlCache};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Label of the local provider
pub const LOCAL_PROVIDER_LABEL: &str = "local";

struct LocalInner {
    config: LocalProviderConfig,
    enabled: AtomicBool,
    stats: StatsRecorder,
    resource_cache: TtlCache<String, Resource>,
    index_cache: IndexCache<ResourceIndex>,
    fragments: std::sync::Mutex<Arc<Vec<ResourceFragment>>>,
    load_lock: tokio::sync::Mutex<()>,
    matcher: ResourceMatcher,
}

/// Filesystem-backed resource provider
pub struct LocalProvider {
    inner: Arc<LocalInner>,
}

impl LocalProvider {
    /// Create a provider over a resource root
    pub fn new(config: LocalProviderConfig) -> Self {
        let cache_capacity = if config.enable_cache {
            config.cache_size
        } else {
            0
        };
        Self {
            inner: Arc::new(LocalInner {
                resource_cache: TtlCache::new(
                    cache_capacity,
                    Duration::from_secs(config.cache_ttl_secs),
                ),
                index_cache: IndexCache::new(Duration::from_secs(config.index_cache_ttl_secs)),
                fragments: std::sync::Mutex::new(Arc::new(Vec::new())),
                load_lock: tokio::sync::Mutex::new(()),
                stats: StatsRecorder::new(LOCAL_PROVIDER_LABEL),
                enabled: AtomicBool::new(true),
                matcher: ResourceMatcher::new(),
                config,
            }),
        }
    }

    /// Current fragment snapshot (empty until the first index load)
    fn fragments(&self) -> Arc<Vec<ResourceFragment>> {
        Arc::clone(&self.inner.fragments.lock().unwrap())
    }
}

impl LocalInner {
    /// Load the index, coalescing concurrent callers
    async fn load_index(inner: &Arc<Self>) -> Result<ResourceIndex> {
        let _guard = inner.load_lock.lock().await;

        // A load that finished while we waited on the lock serves us too
        if let Some(index) = inner.index_cache.get() {
            inner.stats.record_cached();
            return Ok(index);
        }

        let timer = TimedOperation::start();
        let root = inner.config.resources_path.clone();
        if tokio::fs::metadata(&root).await.is_err() {
            inner.stats.record_failure();
            return Err(Error::unavailable(
                LOCAL_PROVIDER_LABEL,
                format!("resource root not readable: {}", root.display()),
            ));
        }

        // One blocking scan per category directory, all in parallel
        let scans = CATEGORY_DIRS.iter().map(|(dir_name, category)| {
            let root = root.clone();
            let dir_name = dir_name.to_string();
            let category = *category;
            tokio::task::spawn_blocking(move || scan_category(&root, &dir_name, category))
        });

        let mut resources: Vec<Resource> = Vec::new();
        for scanned in join_all(scans).await {
            match scanned {
                Ok(batch) => resources.extend(batch),
                Err(error) => {
                    inner.stats.record_failure();
                    return Err(Error::provider(
                        LOCAL_PROVIDER_LABEL,
                        format!("category scan panicked: {error}"),
                    ));
                }
            }
        }

        let fragments: Vec<ResourceFragment> = resources
            .iter()
            .map(|resource| {
                let mut fragment = resource.fragment();
                fragment.id = format!("{}/{}", resource.category.as_str(), resource.id);
                fragment
            })
            .collect();

        let metadata: Vec<ResourceMetadata> = resources.iter().map(Resource::metadata).collect();
        let index = ResourceIndex::from_resources(
            LOCAL_PROVIDER_LABEL,
            env!("CARGO_PKG_VERSION"),
            metadata,
            TOP_TAGS_LOCAL,
        );

        inner.index_cache.set(index.clone(), None);
        *inner.fragments.lock().unwrap() = Arc::new(fragments);
        inner.stats.record_success(timer.elapsed_ms());

        info!(
            total = index.total,
            elapsed_ms = timer.elapsed_ms(),
            "local index loaded"
        );
        Ok(index)
    }
}

#[async_trait]
impl ResourceProvider for LocalProvider {
    fn label(&self) -> &str {
        LOCAL_PROVIDER_LABEL
    }

    fn priority(&self) -> i32 {
        0
    }

    fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    async fn initialize(&self) -> Result<()> {
        let root = &self.inner.config.resources_path;
        if tokio::fs::metadata(root).await.is_err() {
            return Err(Error::unavailable(
                LOCAL_PROVIDER_LABEL,
                format!("resource root not readable: {}", root.display()),
            ));
        }

        // Kick a first index load without awaiting it
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(error) = LocalInner::load_index(&inner).await {
                warn!(%error, "background index load failed");
            }
        });
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.inner.resource_cache.clear();
        self.inner.index_cache.clear();
        *self.inner.fragments.lock().unwrap() = Arc::new(Vec::new());
        Ok(())
    }

    async fn fetch_index(&self) -> Result<ResourceIndex> {
        if let Some(index) = self.inner.index_cache.get() {
            self.inner.stats.record_cached();
            return Ok(index);
        }
        LocalInner::load_index(&self.inner).await
    }

    async fn fetch_resource(&self, id: &str, category: ResourceCategory) -> Result<Resource> {
        let key = format!("{}:{}", category.as_str(), id);
        if let Some(resource) = self.inner.resource_cache.get(&key) {
            self.inner.stats.record_cached();
            return Ok(resource);
        }

        let timer = TimedOperation::start();
        let root = &self.inner.config.resources_path;
        let mut path = root.join(category.plural()).join(format!("{id}.md"));
        // The guides directory is an alias for patterns
        if !path.exists() && category == ResourceCategory::Pattern {
            path = root.join("guides").join(format!("{id}.md"));
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                self.inner.stats.record_not_found();
                return Err(Error::not_found(
                    LOCAL_PROVIDER_LABEL,
                    format!("{}/{id}", category.as_str()),
                ));
            }
            Err(error) => {
                self.inner.stats.record_failure();
                return Err(Error::provider(
                    LOCAL_PROVIDER_LABEL,
                    format!("read failed for {}: {error}", path.display()),
                ));
            }
        };

        let resource = crate::document::resource_from_content(
            &content,
            id,
            category,
            LOCAL_SOURCE,
            &path.display().to_string(),
        );

        self.inner.stats.record_success(timer.elapsed_ms());
        self.inner.stats.record_resource(resource.estimated_tokens);
        self.inner.resource_cache.insert(key, resource.clone());
        Ok(resource)
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        let index = self.fetch_index().await?;
        let fragments = self.fragments();

        let mut request = MatchRequest::new(query);
        request.mode = MatchMode::Catalog;
        request.categories = options.categories.clone();
        request.required_tags = options.required_tags.clone();
        request.min_score = options.min_score;
        // Search selects by count and pagination, not token budget
        request.max_tokens = u32::MAX;
        request.max_results = options.offset.saturating_add(options.max_results);

        let matched = self.inner.matcher.match_resources(&request, &fragments);
        let keywords = extract_keywords(query);

        let mut results: Vec<SearchResult> = matched
            .fragments
            .iter()
            .zip(matched.match_scores.iter())
            .filter_map(|(fragment, score)| {
                let plain_id = fragment
                    .id
                    .split_once('/')
                    .map_or(fragment.id.as_str(), |(_, rest)| rest);
                let resource = index.find(plain_id, fragment.category)?.clone();
                let match_reasons = match_reasons(&resource, &keywords, options);
                Some(SearchResult {
                    resource,
                    score: *score,
                    provider: LOCAL_PROVIDER_LABEL.to_string(),
                    match_reasons,
                })
            })
            .collect();

        apply_sort(&mut results, options.sort, options.direction);

        let total = results.len();
        let facets = SearchFacets::compute(&results);
        let results: Vec<SearchResult> = results
            .into_iter()
            .skip(options.offset)
            .take(options.max_results)
            .collect();

        debug!(query, total, returned = results.len(), "local search complete");
        Ok(SearchResponse {
            results,
            total,
            facets,
            provider_status: Default::default(),
        })
    }

    async fn health_check(&self) -> Result<HealthRecord> {
        let timer = TimedOperation::start();
        let root = &self.inner.config.resources_path;
        let reachable = tokio::fs::metadata(root).await.is_ok();
        let metrics = self.inner.stats.health_metrics();

        let recent_error = self
            .inner
            .stats
            .recent_error_within(Duration::from_secs(RECENT_ERROR_WINDOW_SECS));

        let status = if !reachable || metrics.success_rate < UNHEALTHY_SUCCESS_RATE {
            HealthStatus::Unhealthy
        } else if metrics.success_rate < HEALTHY_SUCCESS_RATE || recent_error {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Ok(HealthRecord {
            provider: LOCAL_PROVIDER_LABEL.to_string(),
            status,
            checked_at: chrono::Utc::now(),
            response_time_ms: timer.elapsed_ms(),
            reachable,
            authenticated: true,
            error: (!reachable).then(|| "resource root unreachable".to_string()),
            metrics,
        })
    }

    async fn stats(&self) -> Result<ProviderStats> {
        Ok(self.inner.stats.snapshot(None))
    }

    async fn reset_stats(&self) -> Result<()> {
        self.inner.stats.reset();
        Ok(())
    }
}

/// Human-readable reasons naming what matched (at most 3)
fn match_reasons(
    resource: &ResourceMetadata,
    keywords: &[String],
    options: &SearchOptions,
) -> Vec<String> {
    let mut reasons = Vec::new();

    let matched_tags: Vec<&str> = resource
        .tags
        .iter()
        .filter(|tag| keywords.iter().any(|k| k == &tag.to_lowercase()))
        .map(String::as_str)
        .collect();
    if !matched_tags.is_empty() {
        reasons.push(format!("tag match: {}", matched_tags.join(", ")));
    }

    let overlapping_caps: Vec<&str> = resource
        .capabilities
        .iter()
        .filter(|cap| {
            let lower = cap.to_lowercase();
            keywords.iter().any(|k| lower.contains(k.as_str()))
        })
        .take(2)
        .map(String::as_str)
        .collect();
    if !overlapping_caps.is_empty() {
        reasons.push(format!("capability: {}", overlapping_caps.join("; ")));
    }

    if options.categories.contains(&resource.category) {
        reasons.push(format!("category match: {}", resource.category));
    }

    reasons.truncate(3);
    reasons
}

/// Apply the requested sort; unknown attributes fall back to relevance
fn apply_sort(results: &mut [SearchResult], sort: SortBy, direction: SortDirection) {
    match sort {
        // Relevance is the matcher's own ordering; popularity is unknown
        // locally and falls back to it as well
        SortBy::Relevance | SortBy::Popularity => {}
        SortBy::Tokens => {
            results.sort_by_key(|r| r.resource.estimated_tokens);
            if direction == SortDirection::Desc {
                results.reverse();
            }
        }
        SortBy::Date => {
            results.sort_by_key(|r| r.resource.updated_at.or(r.resource.created_at));
            if direction == SortDirection::Desc {
                results.reverse();
            }
        }
    }
}
