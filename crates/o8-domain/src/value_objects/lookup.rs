//! Inverted-index artifacts
//!
//! Serialized shapes of the three files the index builder writes under
//! `.index/`: the scenario map, the keyword map, and the quick-lookup cache.
//! Field names are camelCase on the wire; these files are consumed by other
//! tooling as well as the lookup engine.

use crate::entities::ResourceCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One indexable use-when scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEntry {
    /// Original scenario text
    pub scenario: String,
    /// Keywords extracted from the scenario
    pub keywords: Vec<String>,
    /// Static URI of the owning fragment
    pub uri: String,
    /// Category of the owning fragment
    pub category: ResourceCategory,
    /// Estimated tokens of the owning fragment
    pub estimated_tokens: u32,
    /// Default relevance weight assigned at build time
    pub relevance: u32,
}

/// Statistics embedded in the scenario map artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UseWhenIndexStats {
    /// Scenario entries in the index
    pub scenario_count: usize,
    /// Distinct keywords across all scenarios
    pub keyword_count: usize,
    /// Sum of estimated tokens across indexed fragments
    pub total_tokens: u64,
}

/// The scenario map: hash -> scenario entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseWhenIndex {
    /// Artifact format version
    pub version: String,
    /// Generation timestamp
    pub generated: DateTime<Utc>,
    /// Fragments that contributed scenarios
    pub total_fragments: usize,
    /// Scenario entries keyed by stable hash
    pub index: BTreeMap<String, ScenarioEntry>,
    /// Embedded statistics
    pub stats: UseWhenIndexStats,
}

/// Statistics embedded in the keyword map artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct KeywordIndexStats {
    /// Distinct keywords
    pub keyword_count: usize,
    /// Average scenarios per keyword
    pub avg_scenarios_per_keyword: f64,
}

/// The keyword map: keyword -> scenario hashes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordIndex {
    /// Artifact format version
    pub version: String,
    /// Scenario hashes per keyword
    pub keywords: BTreeMap<String, Vec<String>>,
    /// Embedded statistics
    pub stats: KeywordIndexStats,
}

/// One precomputed quick-lookup answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLookupEntry {
    /// URIs of the matched fragments
    pub uris: Vec<String>,
    /// Combined estimated tokens of the matches
    pub tokens: u32,
}

/// The quick-lookup cache: normalized query -> precomputed answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLookup {
    /// Artifact format version
    pub version: String,
    /// Precomputed answers keyed by normalized query
    pub common_queries: BTreeMap<String, QuickLookupEntry>,
}
