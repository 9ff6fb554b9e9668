//! End-to-end federation tests over the facade

use o8::infrastructure::config::{
    AppConfig, LocalProviderConfig, SourceControlProviderConfig,
};
use o8::{RegistryBuilder, ResourceResolution, SearchOptions};
use o8_domain::value_objects::ProviderQueryStatus;
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
        "skills/typescript-api.md",
        "---\ntitle: TypeScript APIs\ntags:\n  - typescript\n  - async\n  - api\ncapabilities:\n  - Build REST APIs with typescript\nuseWhen:\n  - building a typescript api\nestimatedTokens: 740\n---\nSkill body.\n",
    );
    write_resource(
        dir.path(),
        "skills/python-scripting.md",
        "---\ntags:\n  - python\nuseWhen:\n  - automating with python\nestimatedTokens: 300\n---\nSkill body.\n",
    );
    write_resource(
        dir.path(),
        "patterns/worker-pool.md",
        "---\ntags:\n  - concurrency\n  - workers\nestimatedTokens: 400\n---\nPattern body.\n",
    );
    write_resource(
        dir.path(),
        "agents/release-manager.md",
        "---\ntags:\n  - release\nestimatedTokens: 900\n---\nAgent body.\n",
    );
    write_resource(
        dir.path(),
        "workflows/deploy.md",
        "---\ntags:\n  - deployment\nestimatedTokens: 1200\n---\nWorkflow body.\n",
    );
    dir
}

fn local_only_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.registry.enable_health_checks = false;
    config.local = Some(LocalProviderConfig {
        resources_path: dir.path().to_path_buf(),
        ..LocalProviderConfig::default()
    });
    config
}

#[tokio::test]
async fn dynamic_catalog_match_ranks_the_tagged_skill_on_top() {
    let dir = fixture_tree();
    let registry = RegistryBuilder::from_config(local_only_config(&dir))
        .build()
        .await
        .unwrap();

    let options = SearchOptions {
        max_results: 5,
        min_score: 10,
        ..SearchOptions::default()
    };
    let response = registry
        .search_all("build typescript api", &options, &[])
        .await;

    let top_two: Vec<&str> = response
        .results
        .iter()
        .take(2)
        .map(|r| r.resource.id.as_str())
        .collect();
    assert!(top_two.contains(&"typescript-api"));
    assert!(response.results[0]
        .match_reasons
        .iter()
        .any(|reason| reason.contains("tag match")));

    registry.shutdown().await;
}

#[tokio::test]
async fn get_resource_resolves_static_uris_end_to_end() {
    let dir = fixture_tree();
    let registry = RegistryBuilder::from_config(local_only_config(&dir))
        .build()
        .await
        .unwrap();

    match registry
        .get_resource("o8://skill/typescript-api")
        .await
        .unwrap()
    {
        ResourceResolution::Resource(resource) => {
            assert_eq!(resource.id, "typescript-api");
            assert_eq!(resource.estimated_tokens, 740);
            assert!(resource.content.contains("Skill body."));
        }
        ResourceResolution::Matches(_) => panic!("expected a single resource"),
    }

    registry.shutdown().await;
}

#[tokio::test]
async fn fan_out_survives_an_unreachable_network_provider() {
    let dir = fixture_tree();
    let mut config = local_only_config(&dir);
    config.source_control = Some(SourceControlProviderConfig {
        enabled: true,
        repos: vec!["someone/resources".to_string()],
        // Nothing listens here; the connection fails immediately
        api_base_url: "http://127.0.0.1:9".to_string(),
        raw_base_url: "http://127.0.0.1:9".to_string(),
        retry_attempts: 0,
        timeout_secs: 2,
        ..SourceControlProviderConfig::default()
    });

    let registry = RegistryBuilder::from_config(config).build().await.unwrap();
    let response = registry
        .search_all("typescript", &SearchOptions::default(), &[])
        .await;

    // Local answers; the network provider is flagged failed
    assert!(response
        .results
        .iter()
        .any(|r| r.resource.id == "typescript-api"));
    assert!(matches!(
        response.provider_status.get("source-control"),
        Some(ProviderQueryStatus::Failed { .. })
    ));
    assert!(matches!(
        response.provider_status.get("local"),
        Some(ProviderQueryStatus::Succeeded { .. })
    ));

    registry.shutdown().await;
}

#[tokio::test]
async fn list_providers_reflects_configuration() {
    let dir = fixture_tree();
    let registry = RegistryBuilder::from_config(local_only_config(&dir))
        .build()
        .await
        .unwrap();

    let providers = registry.list_providers().await;
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].label, "local");
    assert!(providers[0].enabled);

    registry.shutdown().await;
}

#[tokio::test]
async fn match_uris_resolve_to_scored_result_sets() {
    let dir = fixture_tree();
    let registry = RegistryBuilder::from_config(local_only_config(&dir))
        .build()
        .await
        .unwrap();

    match registry
        .get_resource("o8://skill/match?query=python+automation")
        .await
        .unwrap()
    {
        ResourceResolution::Matches(response) => {
            assert!(response
                .results
                .iter()
                .any(|r| r.resource.id == "python-scripting"));
        }
        ResourceResolution::Resource(_) => panic!("expected matches"),
    }

    registry.shutdown().await;
}
