//! Value objects
//!
//! Parse-validated types shared across the federation: the resource URI
//! grammar, catalog snapshots, search DTOs, health and stats records, and
//! the serialized inverted-index artifacts.

pub mod health;
pub mod index;
pub mod lookup;
pub mod search;
pub mod stats;
pub mod uri;

pub use health::{HealthMetrics, HealthRecord, HealthStatus};
pub use index::{IndexStats, ResourceIndex, TagCount};
pub use lookup::{KeywordIndex, QuickLookup, QuickLookupEntry, ScenarioEntry, UseWhenIndex};
pub use search::{
    ProviderQueryStatus, SearchFacets, SearchOptions, SearchResponse, SearchResult, SortBy,
    SortDirection,
};
pub use stats::{ProviderStats, RateLimitSnapshot};
pub use uri::{MatchMode, MatchParams, ResourceUri, UriKind};
