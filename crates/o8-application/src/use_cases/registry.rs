//! Provider registry
//!
//! Composes resource providers into one federated surface: priority-ordered
//! dispatch, concurrent search fan-out with per-provider failure isolation,
//! background health monitoring with auto-disable, and lifecycle events.
//!
//! The registry is a constructed object with explicit lifetime
//! (new -> start -> serve -> shutdown); nothing here is process-global.

use futures::future::join_all;
use o8_domain::constants::{HEALTH_CHECK_INTERVAL_MS, MAX_CONSECUTIVE_FAILURES};
use o8_domain::entities::{Resource, ResourceCategory};
use o8_domain::error::{Error, Result};
use o8_domain::events::{ProviderEvent, ProviderEventKind, SharedEventPublisher};
use o8_domain::ports::providers::SharedResourceProvider;
use o8_domain::value_objects::uri::{ResourceUri, UriKind};
use o8_domain::value_objects::{
    HealthRecord, HealthStatus, ProviderQueryStatus, ProviderStats, ResourceIndex, SearchFacets,
    SearchOptions, SearchResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// URI scheme accepted by `get_resource`
    pub uri_scheme: String,

    /// Whether the background health ticker runs
    pub enable_health_checks: bool,

    /// Interval between health-check ticks, in milliseconds
    pub health_check_interval_ms: u64,

    /// Whether unhealthy providers are disabled automatically
    pub auto_disable_unhealthy: bool,

    /// Consecutive health-check failures before auto-disable
    pub max_consecutive_failures: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            uri_scheme: "o8".to_string(),
            enable_health_checks: true,
            health_check_interval_ms: HEALTH_CHECK_INTERVAL_MS,
            auto_disable_unhealthy: true,
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// Lifecycle state of a registered provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    /// Registered, not yet initialized
    Pending,
    /// Initialized and serving
    Active,
    /// Disabled manually or by the health monitor
    Disabled,
    /// Shut down (terminal)
    Shutdown,
}

/// Summary row for `list_providers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider label
    pub label: String,
    /// Dispatch priority (lower runs first)
    pub priority: i32,
    /// Whether the provider currently accepts requests
    pub enabled: bool,
    /// Lifecycle state in the registry
    pub state: ProviderState,
}

struct RegistryEntry {
    provider: SharedResourceProvider,
    state: ProviderState,
    health_failures: u32,
    last_status: HealthStatus,
}

/// Resolution of a `get_resource` call
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceResolution {
    /// A static URI resolved to a single resource
    Resource(Box<Resource>),
    /// A match URI resolved to a scored result set
    Matches(SearchResponse),
}

struct Inner {
    entries: RwLock<Vec<RegistryEntry>>,
    config: RegistryConfig,
    events: SharedEventPublisher,
}

/// The provider registry
pub struct ProviderRegistry {
    inner: Arc<Inner>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ProviderRegistry {
    /// Create a registry; call [`start`](Self::start) to begin health
    /// monitoring
    pub fn new(config: RegistryConfig, events: SharedEventPublisher) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(Vec::new()),
                config,
                events,
            }),
            ticker: std::sync::Mutex::new(None),
        }
    }

    /// Spawn the background health ticker, when enabled
    pub fn start(&self) {
        if !self.inner.config.enable_health_checks {
            return;
        }
        let mut ticker = self.ticker.lock().unwrap();
        if ticker.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let interval = Duration::from_millis(self.inner.config.health_check_interval_ms.max(1));
        *ticker = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so providers get a
            // quiet startup window
            tick.tick().await;
            loop {
                tick.tick().await;
                Inner::health_tick(&inner).await;
            }
        }));
    }

    /// Register a provider under its label and initialize it
    ///
    /// Insertion keeps the list ordered by ascending priority, stable on
    /// ties. A failing `initialize` rolls the registration back.
    pub async fn register(&self, provider: SharedResourceProvider) -> Result<()> {
        let label = provider.label().to_string();
        {
            let mut entries = self.inner.entries.write().await;
            if entries.iter().any(|e| e.provider.label() == label) {
                return Err(Error::already_registered(&label));
            }
            let position = entries
                .iter()
                .position(|e| e.provider.priority() > provider.priority())
                .unwrap_or(entries.len());
            entries.insert(
                position,
                RegistryEntry {
                    provider: Arc::clone(&provider),
                    state: ProviderState::Pending,
                    health_failures: 0,
                    last_status: HealthStatus::Unknown,
                },
            );
        }

        if let Err(error) = provider.initialize().await {
            warn!(provider = %label, %error, "provider initialization failed, rolling back");
            let mut entries = self.inner.entries.write().await;
            entries.retain(|e| e.provider.label() != label);
            return Err(error);
        }

        {
            let mut entries = self.inner.entries.write().await;
            if let Some(entry) = entries.iter_mut().find(|e| e.provider.label() == label) {
                entry.state = ProviderState::Active;
            }
        }

        info!(provider = %label, "provider registered");
        self.emit(ProviderEventKind::ProviderRegistered, &label, json!(null))
            .await;
        Ok(())
    }

    /// Unregister a provider and shut it down
    pub async fn unregister(&self, label: &str) -> Result<()> {
        let provider = {
            let mut entries = self.inner.entries.write().await;
            let position = entries
                .iter()
                .position(|e| e.provider.label() == label)
                .ok_or_else(|| Error::unknown_provider(label))?;
            entries.remove(position).provider
        };

        if let Err(error) = provider.shutdown().await {
            warn!(provider = %label, %error, "provider shutdown reported an error");
        }
        self.emit(ProviderEventKind::ProviderUnregistered, label, json!(null))
            .await;
        Ok(())
    }

    /// Labels, priorities, and states of every registered provider
    pub async fn list_providers(&self) -> Vec<ProviderInfo> {
        let entries = self.inner.entries.read().await;
        entries
            .iter()
            .map(|e| ProviderInfo {
                label: e.provider.label().to_string(),
                priority: e.provider.priority(),
                enabled: e.provider.is_enabled(),
                state: e.state,
            })
            .collect()
    }

    /// Enable a provider; a no-op (no event) when already enabled
    pub async fn enable_provider(&self, label: &str) -> Result<()> {
        let changed = {
            let mut entries = self.inner.entries.write().await;
            let entry = entries
                .iter_mut()
                .find(|e| e.provider.label() == label)
                .ok_or_else(|| Error::unknown_provider(label))?;
            if entry.provider.is_enabled() {
                false
            } else {
                entry.provider.set_enabled(true);
                entry.state = ProviderState::Active;
                entry.health_failures = 0;
                true
            }
        };
        if changed {
            self.emit(ProviderEventKind::ProviderEnabled, label, json!(null))
                .await;
        }
        Ok(())
    }

    /// Disable a provider; a no-op (no event) when already disabled
    pub async fn disable_provider(&self, label: &str) -> Result<()> {
        let changed = {
            let mut entries = self.inner.entries.write().await;
            let entry = entries
                .iter_mut()
                .find(|e| e.provider.label() == label)
                .ok_or_else(|| Error::unknown_provider(label))?;
            if entry.provider.is_enabled() {
                entry.provider.set_enabled(false);
                entry.state = ProviderState::Disabled;
                true
            } else {
                false
            }
        };
        if changed {
            self.emit(
                ProviderEventKind::ProviderDisabled,
                label,
                json!({"reason": "manual"}),
            )
            .await;
        }
        Ok(())
    }

    /// Fetch a provider's index by label
    pub async fn get_provider_index(&self, label: &str) -> Result<ResourceIndex> {
        self.provider_by_label(label).await?.fetch_index().await
    }

    /// Fetch a provider's health by label
    pub async fn get_provider_health(&self, label: &str) -> Result<HealthRecord> {
        self.provider_by_label(label).await?.health_check().await
    }

    /// Health of every registered provider, checked concurrently
    pub async fn get_all_providers_health(&self) -> BTreeMap<String, HealthRecord> {
        let providers = self.snapshot_providers(false).await;
        let checks = providers.iter().map(|p| p.health_check());
        let results = join_all(checks).await;

        providers
            .iter()
            .zip(results)
            .map(|(provider, result)| {
                let label = provider.label().to_string();
                let record = result
                    .unwrap_or_else(|error| HealthRecord::unhealthy(&label, error.to_string()));
                (label, record)
            })
            .collect()
    }

    /// Fetch a provider's stats by label
    pub async fn get_provider_stats(&self, label: &str) -> Result<ProviderStats> {
        self.provider_by_label(label).await?.stats().await
    }

    /// Sum of every provider's counters (for the external stats collector)
    pub async fn aggregate_stats(&self) -> Vec<ProviderStats> {
        let providers = self.snapshot_providers(false).await;
        let stats = join_all(providers.iter().map(|p| p.stats())).await;
        stats.into_iter().filter_map(Result::ok).collect()
    }

    /// Flush a provider's caches and refetch its index
    pub async fn reload_provider(&self, label: &str) -> Result<ResourceIndex> {
        let provider = self.provider_by_label(label).await?;
        provider.shutdown().await?;
        provider.initialize().await?;
        provider.fetch_index().await
    }

    /// Fan-out search over the selected providers
    ///
    /// `sources` may be empty or `["all"]` for every provider. Failures are
    /// isolated per provider; partial results come back with a status map.
    pub async fn search_all(
        &self,
        query: &str,
        options: &SearchOptions,
        sources: &[String],
    ) -> SearchResponse {
        let all = sources.is_empty() || sources.iter().any(|s| s == "all");
        let mut status: BTreeMap<String, ProviderQueryStatus> = BTreeMap::new();
        let mut queried: Vec<SharedResourceProvider> = Vec::new();

        {
            let entries = self.inner.entries.read().await;
            for entry in entries.iter() {
                let label = entry.provider.label().to_string();
                if !all && !sources.contains(&label) {
                    continue;
                }
                if !entry.provider.is_enabled() || entry.state != ProviderState::Active {
                    status.insert(
                        label,
                        ProviderQueryStatus::Skipped {
                            reason: "disabled".to_string(),
                        },
                    );
                    continue;
                }
                queried.push(Arc::clone(&entry.provider));
            }
        }

        let responses = join_all(queried.iter().map(|p| p.search(query, options))).await;

        let mut merged: Vec<_> = Vec::new();
        for (provider, response) in queried.iter().zip(responses) {
            let label = provider.label().to_string();
            match response {
                Ok(mut response) => {
                    for result in &mut response.results {
                        result.provider = label.clone();
                    }
                    status.insert(
                        label,
                        ProviderQueryStatus::Succeeded {
                            results: response.results.len(),
                        },
                    );
                    merged.extend(response.results);
                }
                Err(error) => {
                    warn!(provider = %label, %error, "provider search failed, skipping");
                    self.emit(
                        ProviderEventKind::ProviderError,
                        &label,
                        json!({"operation": "search", "error": error.to_string()}),
                    )
                    .await;
                    status.insert(
                        label,
                        ProviderQueryStatus::Failed {
                            error: error.to_string(),
                        },
                    );
                }
            }
        }

        // Stable sort: providers were queried in priority order, so equal
        // scores keep that order
        merged.sort_by(|a, b| b.score.cmp(&a.score));
        let total = merged.len();
        let facets = SearchFacets::compute(&merged);
        merged.truncate(options.max_results);

        debug!(query, total, returned = merged.len(), "fan-out search complete");

        SearchResponse {
            results: merged,
            total,
            facets,
            provider_status: status,
        }
    }

    /// Resolve a resource URI: static URIs try providers in priority order,
    /// match URIs fan out
    pub async fn get_resource(&self, uri: &str) -> Result<ResourceResolution> {
        let parsed = ResourceUri::parse(uri, &self.inner.config.uri_scheme)?;
        match parsed.kind {
            UriKind::Static { category, id } => {
                let resource = self.fetch_from_any(&id, category).await?;
                Ok(ResourceResolution::Resource(Box::new(resource)))
            }
            UriKind::Match(params) => {
                let mut categories = params.categories.clone();
                if let Some(category) = params.category {
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
                let options = SearchOptions {
                    max_results: params.max_results,
                    min_score: params.min_score,
                    categories,
                    required_tags: params.required_tags.clone(),
                    ..SearchOptions::default()
                };
                Ok(ResourceResolution::Matches(
                    self.search_all(&params.query, &options, &[]).await,
                ))
            }
        }
    }

    /// Fetch a resource from a specific provider
    pub async fn fetch_resource(
        &self,
        label: &str,
        id: &str,
        category: ResourceCategory,
    ) -> Result<Resource> {
        self.provider_by_label(label)
            .await?
            .fetch_resource(id, category)
            .await
    }

    /// Subscribe to provider lifecycle events
    pub async fn subscribe(&self) -> Result<o8_domain::events::ProviderEventStream> {
        self.inner.events.subscribe().await
    }

    /// Stop the ticker and shut down every provider, highest priority
    /// number first. Idempotent.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }

        let mut entries = self.inner.entries.write().await;
        for entry in entries.iter_mut().rev() {
            if entry.state == ProviderState::Shutdown {
                continue;
            }
            if let Err(error) = entry.provider.shutdown().await {
                warn!(provider = %entry.provider.label(), %error, "shutdown error");
            }
            entry.state = ProviderState::Shutdown;
        }
        info!("registry shut down");
    }

    async fn provider_by_label(&self, label: &str) -> Result<SharedResourceProvider> {
        let entries = self.inner.entries.read().await;
        entries
            .iter()
            .find(|e| e.provider.label() == label)
            .map(|e| Arc::clone(&e.provider))
            .ok_or_else(|| Error::unknown_provider(label))
    }

    async fn snapshot_providers(&self, enabled_only: bool) -> Vec<SharedResourceProvider> {
        let entries = self.inner.entries.read().await;
        entries
            .iter()
            .filter(|e| !enabled_only || e.provider.is_enabled())
            .map(|e| Arc::clone(&e.provider))
            .collect()
    }

    async fn fetch_from_any(&self, id: &str, category: ResourceCategory) -> Result<Resource> {
        let providers = self.snapshot_providers(true).await;
        let mut last_error: Option<Error> = None;
        for provider in providers {
            match provider.fetch_resource(id, category).await {
                Ok(resource) => return Ok(resource),
                Err(error) => {
                    debug!(provider = %provider.label(), %error, "resource not resolved here");
                    last_error = Some(error);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| Error::not_found("registry", format!("{category}/{id}"))))
    }

    async fn emit(&self, kind: ProviderEventKind, provider: &str, data: serde_json::Value) {
        let event = ProviderEvent::new(kind, provider, data);
        if let Err(error) = self.inner.events.publish(event).await {
            warn!(%error, "event emission failed");
        }
    }
}

impl Inner {
    /// One health-monitor tick: check every provider concurrently, track
    /// failure streaks, auto-disable past the threshold
    async fn health_tick(inner: &Arc<Inner>) {
        let providers: Vec<(String, SharedResourceProvider)> = {
            let entries = inner.entries.read().await;
            entries
                .iter()
                .filter(|e| e.state != ProviderState::Shutdown)
                .map(|e| (e.provider.label().to_string(), Arc::clone(&e.provider)))
                .collect()
        };

        let checks = join_all(providers.iter().map(|(_, p)| p.health_check())).await;

        for ((label, _), result) in providers.iter().zip(checks) {
            let status = match &result {
                Ok(record) => record.status,
                Err(_) => HealthStatus::Unhealthy,
            };

            let mut to_emit: Vec<(ProviderEventKind, serde_json::Value)> = Vec::new();
            {
                let mut entries = inner.entries.write().await;
                let Some(entry) = entries.iter_mut().find(|e| e.provider.label() == *label)
                else {
                    continue;
                };

                if entry.last_status != status {
                    to_emit.push((
                        ProviderEventKind::HealthChanged,
                        json!({
                            "from": entry.last_status,
                            "to": status,
                        }),
                    ));
                    entry.last_status = status;
                }

                if status == HealthStatus::Unhealthy {
                    entry.health_failures += 1;
                    if inner.config.auto_disable_unhealthy
                        && entry.provider.is_enabled()
                        && entry.health_failures >= inner.config.max_consecutive_failures
                    {
                        entry.provider.set_enabled(false);
                        entry.state = ProviderState::Disabled;
                        warn!(
                            provider = %label,
                            failures = entry.health_failures,
                            "auto-disabling unhealthy provider"
                        );
                        to_emit.push((
                            ProviderEventKind::ProviderDisabled,
                            json!({"reason": "auto-disable"}),
                        ));
                    }
                } else {
                    entry.health_failures = 0;
                }
            }

            for (kind, data) in to_emit {
                let event = ProviderEvent::new(kind, label, data);
                if let Err(error) = inner.events.publish(event).await {
                    warn!(%error, "event emission failed");
                }
            }
        }
    }
}

impl ProviderRegistry {
    /// Run one health-check cycle immediately (used by tests and by
    /// operators forcing a probe)
    pub async fn run_health_checks_now(&self) {
        Inner::health_tick(&self.inner).await;
    }
}
