//! Integration tests for the index builder and the lookup tiers over it

use o8_application::lookup::{LookupEngine, LookupOptions, LookupTier};
use o8_domain::entities::ResourceCategory;
use o8_providers::index::builder::{
    scenario_hash, IndexBuilder, INDEX_DIR, KEYWORD_FILE, QUICK_LOOKUP_FILE, USE_WHEN_FILE,
};
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
        "---\ntags:\n  - typescript\n  - api\nuseWhen:\n  - building a typescript api\n  - designing rest endpoints\nestimatedTokens: 740\n---\nBody.\n",
    );
    write_resource(
        dir.path(),
        "patterns/worker-pool.md",
        "---\ntags:\n  - concurrency\nuseWhen:\n  - distributing work across workers\nestimatedTokens: 400\n---\nBody.\n",
    );
    write_resource(
        dir.path(),
        "skills/python-scripting.md",
        "---\ntags:\n  - python\nuseWhen:\n  - automating tasks with python scripts\nestimatedTokens: 300\n---\nBody.\n",
    );
    dir
}

#[test]
fn build_produces_scenarios_for_every_use_when_entry() {
    let dir = fixture_tree();
    let built = IndexBuilder::new(dir.path()).build().unwrap();

    // 2 + 1 + 1 scenarios across three fragments
    assert_eq!(built.use_when.index.len(), 4);
    assert_eq!(built.use_when.total_fragments, 3);
    assert_eq!(built.use_when.stats.scenario_count, 4);

    let entry = built
        .use_when
        .index
        .get(&scenario_hash(
            "building a typescript api",
            "skill/typescript-api",
        ))
        .expect("scenario hash must be derived from text + fragment id");
    assert_eq!(entry.uri, "o8://skill/typescript-api");
    assert_eq!(entry.category, ResourceCategory::Skill);
    assert!(entry.keywords.contains(&"typescript".to_string()));
}

#[test]
fn keyword_map_points_back_at_scenarios() {
    let dir = fixture_tree();
    let built = IndexBuilder::new(dir.path()).build().unwrap();

    let hashes = &built.keywords.keywords["typescript"];
    assert!(!hashes.is_empty());
    for hash in hashes {
        assert!(built.use_when.index.contains_key(hash));
    }
    // Stop words never become keywords
    assert!(!built.keywords.keywords.contains_key("a"));
    assert!(!built.keywords.keywords.contains_key("with"));
}

#[test]
fn artifacts_round_trip_through_disk() {
    let dir = fixture_tree();
    let builder = IndexBuilder::new(dir.path());
    let built = builder.build().unwrap();
    let written_dir = builder.write_to(&built).unwrap();

    assert!(written_dir.ends_with(INDEX_DIR));
    for file in [USE_WHEN_FILE, KEYWORD_FILE, QUICK_LOOKUP_FILE] {
        assert!(written_dir.join(file).is_file());
    }

    let (use_when, keywords, quick) = IndexBuilder::load_from(dir.path()).unwrap().unwrap();
    assert_eq!(use_when, built.use_when);
    assert_eq!(keywords, built.keywords);
    assert_eq!(quick, built.quick);
}

#[test]
fn missing_artifacts_load_as_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(IndexBuilder::load_from(dir.path()).unwrap().is_none());
}

#[test]
fn common_queries_seed_the_quick_lookup() {
    let dir = fixture_tree();
    let built = IndexBuilder::new(dir.path())
        .with_common_queries(vec!["building a typescript api".to_string()])
        .build()
        .unwrap();

    let entry = &built.quick.common_queries["building-a-typescript-api"];
    assert!(entry
        .uris
        .contains(&"o8://skill/typescript-api".to_string()));
    assert!(entry.tokens > 0);
}

#[test]
fn intersecting_query_returns_results_before_score_filtering() {
    let dir = fixture_tree();
    let built = IndexBuilder::new(dir.path()).build().unwrap();
    let engine = LookupEngine::new(
        built.use_when,
        built.keywords,
        Some(built.quick),
        built.fragments,
        "o8",
    );

    // Keywords intersect two different scenarios: the index tier answers
    let outcome = engine.lookup("typescript api endpoints", &LookupOptions::default());
    assert_eq!(outcome.tier, LookupTier::Index);
    assert!(outcome.result_count >= 1);
    assert!(outcome.text.contains("o8://skill/typescript-api"));
}

#[test]
fn unknown_query_escalates_to_fuzzy_fallback() {
    let dir = fixture_tree();
    let built = IndexBuilder::new(dir.path()).build().unwrap();
    let engine = LookupEngine::new(
        built.use_when,
        built.keywords,
        Some(built.quick),
        built.fragments,
        "o8",
    );

    let outcome = engine.lookup("nonexistent-xyzzy", &LookupOptions::default());
    assert_eq!(outcome.tier, LookupTier::FuzzyFallback);
}

#[test]
fn index_and_fuzzy_agree_on_the_top_pointer() {
    let dir = fixture_tree();
    let built = IndexBuilder::new(dir.path()).build().unwrap();

    let engine = LookupEngine::new(
        built.use_when.clone(),
        built.keywords.clone(),
        None,
        built.fragments.clone(),
        "o8",
    );
    let indexed = engine.lookup("building a typescript api", &LookupOptions::default());

    let fuzzy_engine = LookupEngine::without_index(built.fragments, "o8");
    let fuzzy = fuzzy_engine.lookup("building a typescript api", &LookupOptions::default());
    assert_eq!(fuzzy.tier, LookupTier::FuzzyFallback);

    // Both strategies surface the same top resource
    assert!(indexed.text.contains("o8://skill/typescript-api"));
    assert!(fuzzy.text.contains("o8://skill/typescript-api"));
}
