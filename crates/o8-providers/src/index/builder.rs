//! Inverted-index builder
//!
//! Offline (or periodically triggered) scan that turns the filesystem
//! resource tree into the three lookup artifacts: the scenario map, the
//! keyword map, and the quick-lookup cache. Every use-when entry of every
//! fragment becomes one indexable scenario keyed by a stable hash of
//! `scenario-text + fragment-id`.

use crate::local::loader::scan_all;
use o8_application::lookup::{normalize_query, score_scenario};
use o8_domain::entities::ResourceFragment;
use o8_domain::error::Result;
use o8_domain::utils::keywords::extract_keywords;
use o8_domain::value_objects::lookup::{
    KeywordIndex, KeywordIndexStats, QuickLookup, QuickLookupEntry, ScenarioEntry, UseWhenIndex,
    UseWhenIndexStats,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory the artifacts are written under
pub const INDEX_DIR: &str = ".index";

/// Scenario map artifact file name
pub const USE_WHEN_FILE: &str = "usewhen-index.json";

/// Keyword map artifact file name
pub const KEYWORD_FILE: &str = "keyword-index.json";

/// Quick-lookup artifact file name
pub const QUICK_LOOKUP_FILE: &str = "quick-lookup.json";

/// Artifact format version
const FORMAT_VERSION: &str = "1";

/// Default relevance weight assigned to freshly indexed scenarios
const DEFAULT_RELEVANCE: u32 = 50;

/// Stable 64-bit scenario hash: SHA-256 truncated to 8 bytes, hex
pub fn scenario_hash(scenario: &str, fragment_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scenario.as_bytes());
    hasher.update(fragment_id.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// The three artifacts plus the fragments that produced them
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    /// Scenario map
    pub use_when: UseWhenIndex,
    /// Keyword map
    pub keywords: KeywordIndex,
    /// Quick-lookup cache
    pub quick: QuickLookup,
    /// Fragments scanned during the build
    pub fragments: Vec<ResourceFragment>,
}

/// Offline builder over a filesystem resource tree
pub struct IndexBuilder {
    root: PathBuf,
    scheme: String,
    common_queries: Vec<String>,
}

impl IndexBuilder {
    /// Create a builder for a resource root
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            scheme: "o8".to_string(),
            common_queries: Vec::new(),
        }
    }

    /// Set the URI scheme used in scenario entries
    pub fn with_scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Seed the quick-lookup cache with common queries
    pub fn with_common_queries(mut self, queries: Vec<String>) -> Self {
        self.common_queries = queries;
        self
    }

    /// Scan the tree and build all three artifacts in memory
    pub fn build(&self) -> Result<BuiltIndex> {
        let resources = scan_all(&self.root)?;

        let fragments: Vec<ResourceFragment> = resources
            .iter()
            .map(|resource| {
                let mut fragment = resource.fragment();
                fragment.id = format!("{}/{}", resource.category.as_str(), resource.id);
                fragment
            })
            .collect();

        let mut index: BTreeMap<String, ScenarioEntry> = BTreeMap::new();
        let mut keyword_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut total_tokens: u64 = 0;

        for (resource, fragment) in resources.iter().zip(fragments.iter()) {
            total_tokens += u64::from(fragment.estimated_tokens);
            for scenario in &fragment.use_when {
                let hash = scenario_hash(scenario, &fragment.id);
                let keywords = extract_keywords(scenario);
                for keyword in &keywords {
                    let bucket = keyword_map.entry(keyword.clone()).or_default();
                    if !bucket.contains(&hash) {
                        bucket.push(hash.clone());
                    }
                }
                index.insert(
                    hash,
                    ScenarioEntry {
                        scenario: scenario.clone(),
                        keywords,
                        uri: format!(
                            "{}://{}/{}",
                            self.scheme,
                            resource.category.as_str(),
                            resource.id
                        ),
                        category: resource.category,
                        estimated_tokens: fragment.estimated_tokens,
                        relevance: DEFAULT_RELEVANCE,
                    },
                );
            }
        }

        let keyword_count = keyword_map.len();
        let scenario_count = index.len();
        let avg = if keyword_count == 0 {
            0.0
        } else {
            keyword_map.values().map(Vec::len).sum::<usize>() as f64 / keyword_count as f64
        };

        let use_when = UseWhenIndex {
            version: FORMAT_VERSION.to_string(),
            generated: chrono::Utc::now(),
            total_fragments: fragments.len(),
            stats: UseWhenIndexStats {
                scenario_count,
                keyword_count,
                total_tokens,
            },
            index,
        };

        let keywords = KeywordIndex {
            version: FORMAT_VERSION.to_string(),
            keywords: keyword_map,
            stats: KeywordIndexStats {
                keyword_count,
                avg_scenarios_per_keyword: avg,
            },
        };

        let quick = self.seed_quick_lookup(&use_when);

        info!(
            fragments = fragments.len(),
            scenarios = scenario_count,
            keywords = keyword_count,
            "inverted index built"
        );

        Ok(BuiltIndex {
            use_when,
            keywords,
            quick,
            fragments,
        })
    }

    /// Pre-resolve the configured common queries through the keyword tier
    fn seed_quick_lookup(&self, use_when: &UseWhenIndex) -> QuickLookup {
        let mut common_queries = BTreeMap::new();

        for query in &self.common_queries {
            let query_keywords = extract_keywords(query);
            let mut matches: Vec<(&ScenarioEntry, u32)> = use_when
                .index
                .values()
                .filter_map(|entry| {
                    let score = score_scenario(entry, &query_keywords);
                    (score > 0).then_some((entry, score))
                })
                .collect();
            if matches.is_empty() {
                continue;
            }
            matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.uri.cmp(&b.0.uri)));

            let top: Vec<&ScenarioEntry> = matches
                .iter()
                .take(o8_domain::constants::DEFAULT_LOOKUP_RESULTS)
                .map(|(entry, _)| *entry)
                .collect();
            common_queries.insert(
                normalize_query(query),
                QuickLookupEntry {
                    uris: top.iter().map(|e| e.uri.clone()).collect(),
                    tokens: top.iter().map(|e| e.estimated_tokens).sum(),
                },
            );
        }

        debug!(seeded = common_queries.len(), "quick-lookup cache seeded");
        QuickLookup {
            version: FORMAT_VERSION.to_string(),
            common_queries,
        }
    }

    /// Serialize the artifacts under `<root>/.index/`
    pub fn write_to(&self, built: &BuiltIndex) -> Result<PathBuf> {
        let dir = self.root.join(INDEX_DIR);
        std::fs::create_dir_all(&dir)?;

        std::fs::write(
            dir.join(USE_WHEN_FILE),
            serde_json::to_string_pretty(&built.use_when)?,
        )?;
        std::fs::write(
            dir.join(KEYWORD_FILE),
            serde_json::to_string_pretty(&built.keywords)?,
        )?;
        std::fs::write(
            dir.join(QUICK_LOOKUP_FILE),
            serde_json::to_string_pretty(&built.quick)?,
        )?;

        info!(dir = %dir.display(), "index artifacts written");
        Ok(dir)
    }

    /// Read previously written artifacts, if all three are present
    pub fn load_from<P: AsRef<Path>>(root: P) -> Result<Option<(UseWhenIndex, KeywordIndex, QuickLookup)>> {
        let dir = root.as_ref().join(INDEX_DIR);
        let use_when_path = dir.join(USE_WHEN_FILE);
        let keyword_path = dir.join(KEYWORD_FILE);
        let quick_path = dir.join(QUICK_LOOKUP_FILE);
        if !use_when_path.is_file() || !keyword_path.is_file() || !quick_path.is_file() {
            return Ok(None);
        }

        let use_when = serde_json::from_str(&std::fs::read_to_string(use_when_path)?)?;
        let keywords = serde_json::from_str(&std::fs::read_to_string(keyword_path)?)?;
        let quick = serde_json::from_str(&std::fs::read_to_string(quick_path)?)?;
        Ok(Some((use_when, keywords, quick)))
    }

    /// Resource root this builder scans
    pub fn root(&self) -> &Path {
        &self.root
    }
}
