//! Resource entity and projections
//!
//! A resource is the atomic artifact the federation serves: a structured text
//! document (agent definition, skill, example, pattern, or workflow) with a
//! metadata preamble. Providers expose resources through three shapes:
//! the full [`Resource`] (with content), the catalog-level
//! [`ResourceMetadata`] (no content), and the scoring-oriented
//! [`ResourceFragment`].

use crate::constants::CHARS_PER_TOKEN;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource category
///
/// Identifier plus category form the primary key within a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    /// Agent definitions
    Agent,
    /// Skill documents
    Skill,
    /// Worked examples
    Example,
    /// Reusable patterns
    Pattern,
    /// Multi-step workflows
    Workflow,
}

impl ResourceCategory {
    /// All categories, in declaration order
    pub const ALL: [ResourceCategory; 5] = [
        Self::Agent,
        Self::Skill,
        Self::Example,
        Self::Pattern,
        Self::Workflow,
    ];

    /// Singular name used in URIs and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Skill => "skill",
            Self::Example => "example",
            Self::Pattern => "pattern",
            Self::Workflow => "workflow",
        }
    }

    /// Plural directory name used by filesystem layouts
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Agent => "agents",
            Self::Skill => "skills",
            Self::Example => "examples",
            Self::Pattern => "patterns",
            Self::Workflow => "workflows",
        }
    }

    /// Ordering used when assembling full-mode output
    /// (agent, skill, pattern, example, workflow)
    pub fn assembly_rank(&self) -> u8 {
        match self {
            Self::Agent => 0,
            Self::Skill => 1,
            Self::Pattern => 2,
            Self::Example => 3,
            Self::Workflow => 4,
        }
    }

    /// Parse a singular or plural category name
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "agent" | "agents" => Ok(Self::Agent),
            "skill" | "skills" => Ok(Self::Skill),
            "example" | "examples" => Ok(Self::Example),
            "pattern" | "patterns" => Ok(Self::Pattern),
            "workflow" | "workflows" => Ok(Self::Workflow),
            other => Err(Error::invalid_uri(format!("unknown category '{other}'"))),
        }
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimate a token count from raw content length
///
/// `ceil(len / 4)`, clamped to at least 1 so empty resources still
/// satisfy the `estimated_tokens >= 1` invariant.
pub fn estimate_tokens(content: &str) -> u32 {
    let estimate = content.len().div_ceil(CHARS_PER_TOKEN);
    estimate.max(1) as u32
}

/// The atomic artifact served by the federation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier, unique within (provider, category)
    pub id: String,
    /// Resource category
    pub category: ResourceCategory,
    /// Human-readable title
    pub title: String,
    /// Short description
    pub description: String,
    /// Unordered, lowercased tag set
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ordered capability list
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Ordered free-text "use when" scenarios
    #[serde(default)]
    pub use_when: Vec<String>,
    /// Estimated token count, always >= 1
    pub estimated_tokens: u32,
    /// Optional version string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Optional author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Optional creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Optional update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Label of the provider this resource came from
    pub source: String,
    /// Opaque locator at the origin (path, raw URL, ...)
    pub source_uri: String,
    /// Full textual content, post-preamble
    pub content: String,
    /// Opaque dependency identifiers (never resolved by the core)
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Opaque related-resource identifiers
    #[serde(default)]
    pub related: Vec<String>,
}

impl Resource {
    /// Catalog-level projection without content
    pub fn metadata(&self) -> ResourceMetadata {
        ResourceMetadata {
            id: self.id.clone(),
            category: self.category,
            title: self.title.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            capabilities: self.capabilities.clone(),
            use_when: self.use_when.clone(),
            estimated_tokens: self.estimated_tokens,
            version: self.version.clone(),
            author: self.author.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            source: self.source.clone(),
            source_uri: self.source_uri.clone(),
        }
    }

    /// Scoring projection
    pub fn fragment(&self) -> ResourceFragment {
        ResourceFragment {
            id: self.id.clone(),
            category: self.category,
            tags: self.tags.clone(),
            capabilities: self.capabilities.clone(),
            use_when: self.use_when.clone(),
            estimated_tokens: self.estimated_tokens,
            content: self.content.clone(),
        }
    }
}

/// Catalog entry: everything about a resource except its content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Identifier, unique within (provider, category)
    pub id: String,
    /// Resource category
    pub category: ResourceCategory,
    /// Human-readable title
    pub title: String,
    /// Short description
    pub description: String,
    /// Unordered, lowercased tag set
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ordered capability list
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Ordered free-text "use when" scenarios
    #[serde(default)]
    pub use_when: Vec<String>,
    /// Estimated token count
    pub estimated_tokens: u32,
    /// Optional version string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Optional author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Optional creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Optional update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Label of the provider this resource came from
    pub source: String,
    /// Opaque locator at the origin
    pub source_uri: String,
}

/// Lightweight content-bearing projection used for scoring
///
/// The match pipeline operates on fragments only; everything it needs to
/// score and assemble output is here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFragment {
    /// Identifier, unique within (provider, category)
    pub id: String,
    /// Resource category
    pub category: ResourceCategory,
    /// Unordered, lowercased tag set
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ordered capability list
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Ordered free-text "use when" scenarios
    #[serde(default)]
    pub use_when: Vec<String>,
    /// Estimated token count
    pub estimated_tokens: u32,
    /// Full textual content
    pub content: String,
}
