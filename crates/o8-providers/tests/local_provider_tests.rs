//! Integration tests for the local filesystem provider

use o8_domain::entities::ResourceCategory;
use o8_domain::ports::providers::ResourceProvider;
use o8_domain::value_objects::{HealthStatus, SearchOptions, SortBy, SortDirection};
use o8_infrastructure::config::LocalProviderConfig;
use o8_providers::LocalProvider;
use std::path::Path;

fn write_resource(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn fixture_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_resource(
        dir.path(),
        "skills/code-exploration.md",
        "---\nid: code-exploration\ntitle: Code Exploration\ndescription: Explore unfamiliar codebases\ntags:\n  - typescript\n  - async\n  - api\ncapabilities:\n  - Navigate large repositories\n  - Trace call graphs\nuseWhen:\n  - exploring an unfamiliar codebase\n  - building a typescript api\nestimatedTokens: 740\n---\n\n# Code Exploration\n\nHow to explore code.\n",
    );
    write_resource(
        dir.path(),
        "skills/python-scripting.md",
        "---\ntags:\n  - python\nestimatedTokens: 300\nuseWhen:\n  - automating with python\n---\nPython scripting notes.\n",
    );
    write_resource(
        dir.path(),
        "agents/release-manager.md",
        "---\ntags:\n  - release\n  - automation\nestimatedTokens: 900\n---\nRelease agent definition.\n",
    );
    write_resource(dir.path(), "guides/setup-guide.md", "Setup guide body.\n");
    dir
}

fn provider_for(dir: &tempfile::TempDir) -> LocalProvider {
    LocalProvider::new(LocalProviderConfig {
        resources_path: dir.path().to_path_buf(),
        ..LocalProviderConfig::default()
    })
}

#[tokio::test]
async fn static_fetch_returns_the_parsed_resource() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);
    provider.initialize().await.unwrap();

    let resource = provider
        .fetch_resource("code-exploration", ResourceCategory::Skill)
        .await
        .unwrap();
    assert_eq!(resource.id, "code-exploration");
    assert_eq!(resource.category, ResourceCategory::Skill);
    assert_eq!(resource.estimated_tokens, 740);
    assert_eq!(resource.source, "local");
    assert!(resource.content.contains("How to explore code."));
    assert!(!resource.content.contains("estimatedTokens"));
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    let err = provider
        .fetch_resource("missing", ResourceCategory::Skill)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not-found");
}

#[tokio::test]
async fn guides_alias_resolves_as_pattern() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    let resource = provider
        .fetch_resource("setup-guide", ResourceCategory::Pattern)
        .await
        .unwrap();
    assert_eq!(resource.category, ResourceCategory::Pattern);
}

#[tokio::test]
async fn index_covers_every_category_with_stats() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    let index = provider.fetch_index().await.unwrap();
    assert_eq!(index.total, 4);
    assert_eq!(index.provider, "local");
    assert_eq!(index.stats.count_by_category["skill"], 2);
    assert_eq!(index.stats.count_by_category["agent"], 1);
    assert_eq!(index.stats.count_by_category["pattern"], 1);
    assert!(index.stats.total_tokens >= 740 + 300 + 900);
    assert!(index.stats.top_tags.iter().any(|t| t.tag == "typescript"));
    assert!(index.find("code-exploration", ResourceCategory::Skill).is_some());
}

#[tokio::test]
async fn second_index_fetch_is_served_from_cache() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    provider.fetch_index().await.unwrap();
    provider.fetch_index().await.unwrap();

    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.cached_requests, 1);
    assert_eq!(
        stats.total_requests,
        stats.successful_requests + stats.failed_requests + stats.cached_requests
    );
}

#[tokio::test]
async fn repeat_resource_fetches_hit_the_cache() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    provider
        .fetch_resource("code-exploration", ResourceCategory::Skill)
        .await
        .unwrap();
    provider
        .fetch_resource("code-exploration", ResourceCategory::Skill)
        .await
        .unwrap();

    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.cached_requests, 1);
    assert_eq!(stats.resources_fetched, 1);
    assert_eq!(stats.tokens_fetched, 740);
}

#[tokio::test]
async fn search_finds_tagged_skill_with_reasons() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    let response = provider
        .search("build typescript api", &SearchOptions::default())
        .await
        .unwrap();

    assert!(!response.results.is_empty());
    let top = &response.results[0];
    assert_eq!(top.resource.id, "code-exploration");
    assert_eq!(top.provider, "local");
    assert!(top
        .match_reasons
        .iter()
        .any(|reason| reason.starts_with("tag match")));
    assert!(response.facets.categories.contains_key("skill"));
}

#[tokio::test]
async fn empty_query_returns_empty_results() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    let response = provider.search("", &SearchOptions::default()).await.unwrap();
    assert!(response.results.is_empty());
    assert_eq!(response.total, 0);
}

#[tokio::test]
async fn token_sort_and_pagination_apply_after_scoring() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);

    let options = SearchOptions {
        min_score: 0,
        sort: SortBy::Tokens,
        direction: SortDirection::Asc,
        max_results: 2,
        ..SearchOptions::default()
    };
    let response = provider.search("typescript python release", &options).await.unwrap();
    assert!(response.results.len() <= 2);
    if response.results.len() == 2 {
        assert!(
            response.results[0].resource.estimated_tokens
                <= response.results[1].resource.estimated_tokens
        );
    }
}

#[tokio::test]
async fn initialize_twice_is_idempotent() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);
    provider.initialize().await.unwrap();
    provider.initialize().await.unwrap();

    // Background kicks coalesce: one scan at most, still one index
    let index = provider.fetch_index().await.unwrap();
    assert_eq!(index.total, 4);
}

#[tokio::test]
async fn initialize_fails_on_unreadable_root() {
    let provider = LocalProvider::new(LocalProviderConfig {
        resources_path: "/definitely/not/a/real/root".into(),
        ..LocalProviderConfig::default()
    });
    let err = provider.initialize().await.unwrap_err();
    assert_eq!(err.kind(), "unavailable");
}

#[tokio::test]
async fn health_reflects_root_reachability() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);
    provider.fetch_index().await.unwrap();

    let health = provider.health_check().await.unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert!(health.reachable);

    let broken = LocalProvider::new(LocalProviderConfig {
        resources_path: "/definitely/not/a/real/root".into(),
        ..LocalProviderConfig::default()
    });
    let health = broken.health_check().await.unwrap();
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert!(!health.reachable);
}

#[tokio::test]
async fn reset_stats_twice_zeroes_counters() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);
    provider.fetch_index().await.unwrap();

    provider.reset_stats().await.unwrap();
    provider.reset_stats().await.unwrap();
    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.total_requests, 0);
}

#[tokio::test]
async fn shutdown_clears_caches_and_is_idempotent() {
    let dir = fixture_tree();
    let provider = provider_for(&dir);
    provider.fetch_index().await.unwrap();

    provider.shutdown().await.unwrap();
    provider.shutdown().await.unwrap();

    // The next index fetch rescans instead of hitting the cache
    provider.fetch_index().await.unwrap();
    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.cached_requests, 0);
}

#[tokio::test]
async fn concurrent_index_loads_coalesce() {
    let dir = fixture_tree();
    let provider = std::sync::Arc::new(provider_for(&dir));

    let a = {
        let p = std::sync::Arc::clone(&provider);
        tokio::spawn(async move { p.fetch_index().await })
    };
    let b = {
        let p = std::sync::Arc::clone(&provider);
        tokio::spawn(async move { p.fetch_index().await })
    };

    let index_a = a.await.unwrap().unwrap();
    let index_b = b.await.unwrap().unwrap();
    assert_eq!(index_a.total, index_b.total);

    // Exactly one scan hit the disk; the other call was coalesced/cached
    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.successful_requests, 1);
}
