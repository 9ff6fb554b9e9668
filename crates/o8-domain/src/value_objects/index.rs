//! Resource index snapshot
//!
//! A provider's catalog at a point in time: the ordered metadata list plus
//! derived statistics. Indexes carry no content; content is fetched per
//! resource.

use crate::entities::{ResourceCategory, ResourceMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tag with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    /// Tag text
    pub tag: String,
    /// Number of resources carrying the tag
    pub count: usize,
}

/// Derived catalog statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IndexStats {
    /// Resource count per category
    pub count_by_category: BTreeMap<String, usize>,
    /// Sum of estimated tokens across the catalog
    pub total_tokens: u64,
    /// Most frequent tags, descending by count
    pub top_tags: Vec<TagCount>,
}

impl IndexStats {
    /// Compute statistics over a metadata list
    pub fn compute(resources: &[ResourceMetadata], top_n: usize) -> Self {
        let mut count_by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_tokens: u64 = 0;
        let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();

        for resource in resources {
            *count_by_category
                .entry(resource.category.as_str().to_string())
                .or_default() += 1;
            total_tokens += u64::from(resource.estimated_tokens);
            for tag in &resource.tags {
                *tag_counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        let mut top_tags: Vec<TagCount> = tag_counts
            .into_iter()
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();
        // Descending by count, alphabetical within a count for determinism
        top_tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        top_tags.truncate(top_n);

        Self {
            count_by_category,
            total_tokens,
            top_tags,
        }
    }
}

/// Snapshot of a provider's catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIndex {
    /// Label of the provider that produced this index
    pub provider: String,
    /// Total resource count
    pub total: usize,
    /// Ordered resource metadata, no content
    pub resources: Vec<ResourceMetadata>,
    /// Version tag of the snapshot
    pub version: String,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Categories present in the catalog
    pub categories: Vec<ResourceCategory>,
    /// Derived statistics
    pub stats: IndexStats,
}

impl ResourceIndex {
    /// Build an index from a metadata list, deriving totals and stats
    pub fn from_resources(
        provider: impl Into<String>,
        version: impl Into<String>,
        resources: Vec<ResourceMetadata>,
        top_tags: usize,
    ) -> Self {
        let stats = IndexStats::compute(&resources, top_tags);
        let mut categories: Vec<ResourceCategory> =
            resources.iter().map(|r| r.category).collect();
        categories.sort();
        categories.dedup();

        Self {
            provider: provider.into(),
            total: resources.len(),
            resources,
            version: version.into(),
            generated_at: Utc::now(),
            categories,
            stats,
        }
    }

    /// Look up a metadata entry by primary key
    pub fn find(&self, id: &str, category: ResourceCategory) -> Option<&ResourceMetadata> {
        self.resources
            .iter()
            .find(|r| r.id == id && r.category == category)
    }
}
