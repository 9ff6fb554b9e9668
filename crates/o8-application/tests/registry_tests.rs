//! Integration tests for the provider registry

use async_trait::async_trait;
use futures::StreamExt;
use o8_application::use_cases::registry::{
    ProviderRegistry, ProviderState, RegistryConfig, ResourceResolution,
};
use o8_domain::entities::{Resource, ResourceCategory, ResourceMetadata};
use o8_domain::error::{Error, Result};
use o8_domain::events::ProviderEventKind;
use o8_domain::ports::providers::ResourceProvider;
use o8_domain::value_objects::{
    HealthRecord, ProviderQueryStatus, ProviderStats, ResourceIndex, SearchOptions,
    SearchResponse, SearchResult,
};
use o8_infrastructure::TokioEventBus;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Scripted in-memory provider
struct MockProvider {
    label: String,
    priority: i32,
    enabled: AtomicBool,
    healthy: AtomicBool,
    fail_search: bool,
    fail_init: bool,
    init_calls: AtomicU32,
    shutdown_calls: AtomicU32,
    results: Vec<(String, u32)>,
}

impl MockProvider {
    fn new(label: &str, priority: i32) -> Self {
        Self {
            label: label.to_string(),
            priority,
            enabled: AtomicBool::new(true),
            healthy: AtomicBool::new(true),
            fail_search: false,
            fail_init: false,
            init_calls: AtomicU32::new(0),
            shutdown_calls: AtomicU32::new(0),
            results: Vec::new(),
        }
    }

    fn with_results(mut self, results: &[(&str, u32)]) -> Self {
        self.results = results
            .iter()
            .map(|(id, score)| (id.to_string(), *score))
            .collect();
        self
    }

    fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn metadata(&self, id: &str) -> ResourceMetadata {
        ResourceMetadata {
            id: id.to_string(),
            category: ResourceCategory::Skill,
            title: id.to_string(),
            description: String::new(),
            tags: vec!["mock".to_string()],
            capabilities: Vec::new(),
            use_when: Vec::new(),
            estimated_tokens: 100,
            version: None,
            author: None,
            created_at: None,
            updated_at: None,
            source: self.label.clone(),
            source_uri: format!("mock://{id}"),
        }
    }
}

#[async_trait]
impl ResourceProvider for MockProvider {
    fn label(&self) -> &str {
        &self.label
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    async fn initialize(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(Error::unavailable(&self.label, "scripted init failure"));
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_index(&self) -> Result<ResourceIndex> {
        let resources = self.results.iter().map(|(id, _)| self.metadata(id)).collect();
        Ok(ResourceIndex::from_resources(&self.label, "1", resources, 10))
    }

    async fn fetch_resource(&self, id: &str, category: ResourceCategory) -> Result<Resource> {
        if self.results.iter().any(|(rid, _)| rid == id) {
            let metadata = self.metadata(id);
            Ok(Resource {
                id: metadata.id,
                category,
                title: id.to_string(),
                description: String::new(),
                tags: metadata.tags,
                capabilities: Vec::new(),
                use_when: Vec::new(),
                estimated_tokens: 100,
                version: None,
                author: None,
                created_at: None,
                updated_at: None,
                source: self.label.clone(),
                source_uri: format!("mock://{id}"),
                content: format!("content of {id}"),
                dependencies: Vec::new(),
                related: Vec::new(),
            })
        } else {
            Err(Error::not_found(&self.label, id))
        }
    }

    async fn search(&self, _query: &str, _options: &SearchOptions) -> Result<SearchResponse> {
        if self.fail_search {
            return Err(Error::unavailable(&self.label, "scripted search failure"));
        }
        let results: Vec<SearchResult> = self
            .results
            .iter()
            .map(|(id, score)| SearchResult {
                resource: self.metadata(id),
                score: *score,
                provider: self.label.clone(),
                match_reasons: vec![format!("tag match: mock")],
            })
            .collect();
        Ok(SearchResponse {
            total: results.len(),
            facets: Default::default(),
            provider_status: Default::default(),
            results,
        })
    }

    async fn health_check(&self) -> Result<HealthRecord> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(HealthRecord::healthy(&self.label))
        } else {
            Err(Error::unavailable(&self.label, "scripted unhealthy"))
        }
    }

    async fn stats(&self) -> Result<ProviderStats> {
        Ok(ProviderStats::zeroed(&self.label))
    }

    async fn reset_stats(&self) -> Result<()> {
        Ok(())
    }
}

fn registry(max_failures: u32) -> ProviderRegistry {
    let config = RegistryConfig {
        enable_health_checks: false,
        max_consecutive_failures: max_failures,
        ..RegistryConfig::default()
    };
    ProviderRegistry::new(config, TokioEventBus::new_shared())
}

#[tokio::test]
async fn duplicate_labels_are_rejected() {
    let registry = registry(5);
    registry
        .register(Arc::new(MockProvider::new("local", 0)))
        .await
        .unwrap();
    let err = registry
        .register(Arc::new(MockProvider::new("local", 1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "already-registered");
}

#[tokio::test]
async fn failed_initialization_rolls_back_registration() {
    let registry = registry(5);
    let err = registry
        .register(Arc::new(MockProvider::new("broken", 0).failing_init()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unavailable");
    assert!(registry.list_providers().await.is_empty());
}

#[tokio::test]
async fn providers_are_ordered_by_priority_stable_on_ties() {
    let registry = registry(5);
    registry
        .register(Arc::new(MockProvider::new("git", 20)))
        .await
        .unwrap();
    registry
        .register(Arc::new(MockProvider::new("local", 0)))
        .await
        .unwrap();
    registry
        .register(Arc::new(MockProvider::new("catalog", 10)))
        .await
        .unwrap();
    registry
        .register(Arc::new(MockProvider::new("git-two", 20)))
        .await
        .unwrap();

    let labels: Vec<String> = registry
        .list_providers()
        .await
        .into_iter()
        .map(|p| p.label)
        .collect();
    assert_eq!(labels, vec!["local", "catalog", "git", "git-two"]);
}

#[tokio::test]
async fn search_all_merges_and_sorts_across_providers() {
    let registry = registry(5);
    registry
        .register(Arc::new(
            MockProvider::new("local", 0).with_results(&[("alpha", 90), ("beta", 40)]),
        ))
        .await
        .unwrap();
    registry
        .register(Arc::new(
            MockProvider::new("catalog", 10).with_results(&[("gamma", 70)]),
        ))
        .await
        .unwrap();

    let response = registry
        .search_all("anything", &SearchOptions::default(), &[])
        .await;
    let ids: Vec<&str> = response
        .results
        .iter()
        .map(|r| r.resource.id.as_str())
        .collect();
    assert_eq!(ids, vec!["alpha", "gamma", "beta"]);
    assert_eq!(response.total, 3);
    assert_eq!(response.results[1].provider, "catalog");
}

#[tokio::test]
async fn search_all_isolates_provider_failures() {
    let registry = registry(5);
    registry
        .register(Arc::new(
            MockProvider::new("local", 0).with_results(&[("alpha", 50)]),
        ))
        .await
        .unwrap();
    registry
        .register(Arc::new(MockProvider::new("flaky", 10).failing_search()))
        .await
        .unwrap();

    let response = registry
        .search_all("anything", &SearchOptions::default(), &[])
        .await;
    assert_eq!(response.results.len(), 1);
    assert!(matches!(
        response.provider_status.get("flaky"),
        Some(ProviderQueryStatus::Failed { .. })
    ));
    assert!(matches!(
        response.provider_status.get("local"),
        Some(ProviderQueryStatus::Succeeded { results: 1 })
    ));
}

#[tokio::test]
async fn search_all_respects_source_selection_and_disabled_providers() {
    let registry = registry(5);
    registry
        .register(Arc::new(
            MockProvider::new("local", 0).with_results(&[("alpha", 50)]),
        ))
        .await
        .unwrap();
    registry
        .register(Arc::new(
            MockProvider::new("catalog", 10).with_results(&[("gamma", 70)]),
        ))
        .await
        .unwrap();

    registry.disable_provider("catalog").await.unwrap();
    let response = registry
        .search_all("anything", &SearchOptions::default(), &[])
        .await;
    assert_eq!(response.results.len(), 1);
    assert!(matches!(
        response.provider_status.get("catalog"),
        Some(ProviderQueryStatus::Skipped { .. })
    ));

    // Explicit source selection
    registry.enable_provider("catalog").await.unwrap();
    let response = registry
        .search_all(
            "anything",
            &SearchOptions::default(),
            &["catalog".to_string()],
        )
        .await;
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].provider, "catalog");
}

#[tokio::test]
async fn get_resource_routes_static_uris_in_priority_order() {
    let registry = registry(5);
    registry
        .register(Arc::new(
            MockProvider::new("local", 0).with_results(&[("alpha", 50)]),
        ))
        .await
        .unwrap();
    registry
        .register(Arc::new(
            MockProvider::new("catalog", 10).with_results(&[("beta", 50)]),
        ))
        .await
        .unwrap();

    match registry.get_resource("o8://skill/beta").await.unwrap() {
        ResourceResolution::Resource(resource) => {
            assert_eq!(resource.id, "beta");
            assert_eq!(resource.source, "catalog");
        }
        ResourceResolution::Matches(_) => panic!("expected a resource"),
    }

    let err = registry.get_resource("o8://skill/missing").await.unwrap_err();
    assert_eq!(err.kind(), "not-found");

    let err = registry.get_resource("bad://skill/x").await.unwrap_err();
    assert_eq!(err.kind(), "invalid-uri");
}

#[tokio::test]
async fn get_resource_match_uris_fan_out() {
    let registry = registry(5);
    registry
        .register(Arc::new(
            MockProvider::new("local", 0).with_results(&[("alpha", 80)]),
        ))
        .await
        .unwrap();

    match registry
        .get_resource("o8://match?query=anything")
        .await
        .unwrap()
    {
        ResourceResolution::Matches(response) => {
            assert_eq!(response.results.len(), 1);
        }
        ResourceResolution::Resource(_) => panic!("expected matches"),
    }
}

#[tokio::test]
async fn unknown_provider_dispatch_fails() {
    let registry = registry(5);
    let err = registry.get_provider_index("ghost").await.unwrap_err();
    assert_eq!(err.kind(), "unknown-provider");
}

#[tokio::test]
async fn enable_is_idempotent_and_emits_no_duplicate_events() {
    let bus = TokioEventBus::new_shared();
    let config = RegistryConfig {
        enable_health_checks: false,
        ..RegistryConfig::default()
    };
    let registry = ProviderRegistry::new(config, bus.clone());
    registry
        .register(Arc::new(MockProvider::new("local", 0)))
        .await
        .unwrap();

    let mut events = registry.subscribe().await.unwrap();

    // Already enabled: no event
    registry.enable_provider("local").await.unwrap();
    registry.disable_provider("local").await.unwrap();

    let event = events.next().await.unwrap();
    assert_eq!(event.kind, ProviderEventKind::ProviderDisabled);
    assert_eq!(event.data["reason"], "manual");
}

#[tokio::test]
async fn auto_disable_after_consecutive_failures() {
    let bus = TokioEventBus::new_shared();
    let config = RegistryConfig {
        enable_health_checks: false,
        auto_disable_unhealthy: true,
        max_consecutive_failures: 3,
        ..RegistryConfig::default()
    };
    let registry = ProviderRegistry::new(config, bus.clone());

    let provider = Arc::new(MockProvider::new("flaky", 0));
    registry.register(Arc::clone(&provider) as _).await.unwrap();

    let mut events = registry.subscribe().await.unwrap();
    provider.set_healthy(false);

    for _ in 0..3 {
        registry.run_health_checks_now().await;
    }

    let info = &registry.list_providers().await[0];
    assert!(!info.enabled);
    assert_eq!(info.state, ProviderState::Disabled);

    // First event is the health transition, then the auto-disable
    let mut saw_auto_disable = false;
    for _ in 0..2 {
        let event = events.next().await.unwrap();
        if event.kind == ProviderEventKind::ProviderDisabled {
            assert_eq!(event.data["reason"], "auto-disable");
            saw_auto_disable = true;
        }
    }
    assert!(saw_auto_disable);

    // Recovery is manual: re-enabling resets the failure streak
    provider.set_healthy(true);
    registry.enable_provider("flaky").await.unwrap();
    assert!(registry.list_providers().await[0].enabled);
}

#[tokio::test]
async fn unhealthy_below_threshold_keeps_provider_enabled() {
    let registry = registry(5);
    let provider = Arc::new(MockProvider::new("flaky", 0));
    registry.register(Arc::clone(&provider) as _).await.unwrap();

    provider.set_healthy(false);
    registry.run_health_checks_now().await;
    registry.run_health_checks_now().await;

    assert!(registry.list_providers().await[0].enabled);
}

#[tokio::test]
async fn shutdown_reaches_every_provider_and_is_idempotent() {
    let registry = registry(5);
    let a = Arc::new(MockProvider::new("a", 0));
    let b = Arc::new(MockProvider::new("b", 10));
    registry.register(Arc::clone(&a) as _).await.unwrap();
    registry.register(Arc::clone(&b) as _).await.unwrap();

    registry.shutdown().await;
    registry.shutdown().await;

    assert_eq!(a.shutdown_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b.shutdown_calls.load(Ordering::SeqCst), 1);
    assert!(registry
        .list_providers()
        .await
        .iter()
        .all(|p| p.state == ProviderState::Shutdown));
}

#[tokio::test]
async fn health_snapshot_covers_all_providers() {
    let registry = registry(5);
    let healthy = Arc::new(MockProvider::new("up", 0));
    let unhealthy = Arc::new(MockProvider::new("down", 10));
    unhealthy.set_healthy(false);
    registry.register(Arc::clone(&healthy) as _).await.unwrap();
    registry.register(Arc::clone(&unhealthy) as _).await.unwrap();

    let health = registry.get_all_providers_health().await;
    assert_eq!(health.len(), 2);
    assert!(health["up"].reachable);
    assert!(!health["down"].reachable);
}
