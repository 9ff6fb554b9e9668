//! Search value objects
//!
//! Options and response shapes shared by every provider's `search` and the
//! registry's fan-out.

use crate::constants::{DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE};
use crate::entities::{ResourceCategory, ResourceMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sort attribute for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Match score (the default)
    #[default]
    Relevance,
    /// Estimated token count
    Tokens,
    /// Update (or creation) timestamp
    Date,
    /// Download/popularity counters where the backend has them
    Popularity,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending (the default)
    #[default]
    Desc,
}

/// Options accepted by provider search and registry fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Cap on returned results
    pub max_results: usize,
    /// Score threshold below which results are discarded
    pub min_score: u32,
    /// Restrict results to these categories (empty = all)
    #[serde(default)]
    pub categories: Vec<ResourceCategory>,
    /// Tags that must all be present
    #[serde(default)]
    pub required_tags: Vec<String>,
    /// Tags that add score when present
    #[serde(default)]
    pub optional_tags: Vec<String>,
    /// Sort attribute
    #[serde(default)]
    pub sort: SortBy,
    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
    /// Pagination offset applied after sorting
    #[serde(default)]
    pub offset: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
            categories: Vec::new(),
            required_tags: Vec::new(),
            optional_tags: Vec::new(),
            sort: SortBy::default(),
            direction: SortDirection::default(),
            offset: 0,
        }
    }
}

/// A single scored search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched resource (metadata projection)
    pub resource: ResourceMetadata,
    /// Relevance score, 0-100
    pub score: u32,
    /// Label of the provider that produced the result
    pub provider: String,
    /// Human-readable explanations of what matched (at most 3)
    #[serde(default)]
    pub match_reasons: Vec<String>,
}

/// Category and tag counts over a result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchFacets {
    /// Result count per category
    pub categories: BTreeMap<String, usize>,
    /// Result count per tag
    pub tags: BTreeMap<String, usize>,
}

impl SearchFacets {
    /// Compute facets over a result list
    pub fn compute(results: &[SearchResult]) -> Self {
        let mut facets = Self::default();
        for result in results {
            *facets
                .categories
                .entry(result.resource.category.as_str().to_string())
                .or_default() += 1;
            for tag in &result.resource.tags {
                *facets.tags.entry(tag.clone()).or_default() += 1;
            }
        }
        facets
    }
}

/// Outcome of querying one provider inside a fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProviderQueryStatus {
    /// Provider answered
    Succeeded {
        /// Number of results it contributed before global trimming
        results: usize,
    },
    /// Provider failed; its results are absent
    Failed {
        /// Error description
        error: String,
    },
    /// Provider was not queried
    Skipped {
        /// Why it was skipped (disabled, unhealthy, not selected)
        reason: String,
    },
}

/// Response from a provider search or a registry fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Scored results, descending by score
    pub results: Vec<SearchResult>,
    /// Result count before pagination trimming
    pub total: usize,
    /// Facets over the (pre-pagination) result set
    #[serde(default)]
    pub facets: SearchFacets,
    /// Per-provider outcome map (fan-out only; single providers report
    /// themselves)
    #[serde(default)]
    pub provider_status: BTreeMap<String, ProviderQueryStatus>,
}

impl SearchResponse {
    /// An empty response
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total: 0,
            facets: SearchFacets::default(),
            provider_status: BTreeMap::new(),
        }
    }
}
