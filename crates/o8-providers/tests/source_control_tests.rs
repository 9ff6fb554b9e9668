//! Integration tests for the source-control provider against a mock
//! HTTP server

use mockito::Server;
use o8_domain::entities::ResourceCategory;
use o8_domain::ports::providers::ResourceProvider;
use o8_domain::value_objects::HealthStatus;
use o8_infrastructure::config::SourceControlProviderConfig;
use o8_providers::SourceControlProvider;
use serde_json::json;

fn tree_body() -> String {
    json!({
        "sha": "abc123",
        "tree": [
            {"path": "skills/code-review.md", "type": "blob", "size": 2960},
            {"path": "skills/nested/deep-dive.md", "type": "blob", "size": 400},
            {"path": "agents/planner.md", "type": "blob", "size": 1200},
            {"path": "docs/readme.md", "type": "blob", "size": 100},
            {"path": "skills", "type": "tree"},
            {"path": "README.md", "type": "blob", "size": 50}
        ]
    })
    .to_string()
}

fn config_for(server: &Server, repos: &[&str]) -> SourceControlProviderConfig {
    SourceControlProviderConfig {
        enabled: true,
        repos: repos.iter().map(|r| r.to_string()).collect(),
        branch: "main".to_string(),
        api_base_url: server.url(),
        raw_base_url: server.url(),
        retry_attempts: 0,
        timeout_secs: 5,
        ..SourceControlProviderConfig::default()
    }
}

#[tokio::test]
async fn tree_listing_is_classified_into_categories() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/repos/someone/resources/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(tree_body())
        .expect(1)
        .create_async()
        .await;

    let provider = SourceControlProvider::new(config_for(&server, &["someone/resources"])).unwrap();
    let index = provider.fetch_index().await.unwrap();

    // docs/ and root files classify to nothing; trees are skipped
    assert_eq!(index.total, 3);
    let skill = index.find("code-review", ResourceCategory::Skill).unwrap();
    assert_eq!(skill.estimated_tokens, 740);
    assert!(skill.source_uri.ends_with("/someone/resources/main/skills/code-review.md"));
    assert!(index.find("deep-dive", ResourceCategory::Skill).is_some());
    assert!(index.find("planner", ResourceCategory::Agent).is_some());
}

#[tokio::test]
async fn fetch_resource_issues_one_raw_fetch_then_caches() {
    let mut server = Server::new_async().await;
    let _tree = server
        .mock("GET", "/repos/someone/resources/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(tree_body())
        .create_async()
        .await;
    let raw = server
        .mock("GET", "/someone/resources/main/skills/code-review.md")
        .with_status(200)
        .with_body("---\ntags:\n  - review\nestimatedTokens: 650\n---\nHow to review code.\n")
        .expect(1)
        .create_async()
        .await;

    let provider = SourceControlProvider::new(config_for(&server, &["someone/resources"])).unwrap();
    let resource = provider
        .fetch_resource("code-review", ResourceCategory::Skill)
        .await
        .unwrap();
    assert_eq!(resource.estimated_tokens, 650);
    assert_eq!(resource.tags, vec!["review"]);
    assert!(resource.content.contains("How to review code."));

    // Second fetch comes from the resource cache
    provider
        .fetch_resource("code-review", ResourceCategory::Skill)
        .await
        .unwrap();
    raw.assert_async().await;

    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.cached_requests, 1);
    assert_eq!(stats.resources_fetched, 1);
}

#[tokio::test]
async fn unknown_resources_are_not_found_without_a_raw_fetch() {
    let mut server = Server::new_async().await;
    let _tree = server
        .mock("GET", "/repos/someone/resources/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(tree_body())
        .create_async()
        .await;

    let provider = SourceControlProvider::new(config_for(&server, &["someone/resources"])).unwrap();
    let err = provider
        .fetch_resource("ghost", ResourceCategory::Skill)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not-found");
}

#[tokio::test]
async fn one_failing_repository_does_not_sink_the_merge() {
    let mut server = Server::new_async().await;
    let _good = server
        .mock("GET", "/repos/good/resources/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(tree_body())
        .create_async()
        .await;
    let _bad = server
        .mock("GET", "/repos/bad/resources/git/trees/main?recursive=1")
        .with_status(500)
        .create_async()
        .await;

    let provider =
        SourceControlProvider::new(config_for(&server, &["good/resources", "bad/resources"]))
            .unwrap();
    let index = provider.fetch_index().await.unwrap();
    assert_eq!(index.total, 3);
}

#[tokio::test]
async fn total_failure_is_unavailable_and_unhealthy() {
    let mut server = Server::new_async().await;
    let _bad = server
        .mock("GET", "/repos/bad/resources/git/trees/main?recursive=1")
        .with_status(500)
        .expect_at_least(1)
        .create_async()
        .await;

    let provider = SourceControlProvider::new(config_for(&server, &["bad/resources"])).unwrap();
    // Transient 5xx responses exhaust retries into an unavailable error
    let err = provider.fetch_index().await.unwrap_err();
    assert_eq!(err.kind(), "unavailable");

    let health = provider.health_check().await.unwrap();
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert!(!health.reachable);
}

#[tokio::test]
async fn auth_token_is_sent_as_bearer() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/someone/resources/git/trees/main?recursive=1")
        .match_header("Authorization", "Bearer sekrit")
        .with_status(200)
        .with_body(tree_body())
        .expect(1)
        .create_async()
        .await;

    let mut config = config_for(&server, &["someone/resources"]);
    config.auth = Some(o8_infrastructure::config::AuthConfig {
        token: "sekrit".to_string(),
        auth_type: "bearer".to_string(),
    });
    let provider = SourceControlProvider::new(config).unwrap();
    provider.fetch_index().await.unwrap();
    mock.assert_async().await;
}
