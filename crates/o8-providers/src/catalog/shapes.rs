//! Catalog JSON shapes
//!
//! Community catalogs are served in several top-level layouts. Rather than
//! guessing with untagged deserialization, the layouts are explicit variants
//! dispatched by shape inspection: an array is the flat form, an object with
//! a `components` key is the wrapped form, and any other object is treated
//! as a category-keyed map whose array values are flattened.

use o8_domain::entities::ResourceCategory;
use o8_domain::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// One component as served by the catalog
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawComponent {
    /// Component identifier
    #[serde(alias = "id")]
    pub name: String,
    /// Component type (agent, command, skill, mcp, hook, setting, template)
    #[serde(rename = "type", alias = "componentType", default)]
    pub component_type: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// Full content, usually with a metadata preamble
    #[serde(default)]
    pub content: String,
    /// Tag list
    #[serde(default)]
    pub tags: Vec<String>,
    /// Download counter
    #[serde(default)]
    pub downloads: u64,
    /// Backend validation record
    #[serde(default)]
    pub validation: Option<ValidationRecord>,
}

/// Backend validation record for a component
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ValidationRecord {
    /// Whether the backend considers the component valid
    #[serde(default)]
    pub valid: bool,
    /// Validation score, 0-100
    #[serde(default)]
    pub score: f64,
}

/// Top-level catalog layouts, as labeled variants
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogDocument {
    /// A bare array of components
    Flat(Vec<RawComponent>),
    /// `{"components": [...]}`
    Wrapped(Vec<RawComponent>),
    /// `{"agents": [...], "skills": [...], ...}` - every array-valued key
    /// contributes
    Categorized(Vec<RawComponent>),
}

impl CatalogDocument {
    /// Dispatch on the document shape
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let components = deserialize_components(items)?;
                Ok(Self::Flat(components))
            }
            Value::Object(mut map) => {
                if let Some(components) = map.remove("components") {
                    let items = components
                        .as_array()
                        .cloned()
                        .ok_or_else(|| parse_error("'components' is not an array"))?;
                    return Ok(Self::Wrapped(deserialize_components(items)?));
                }

                // Category-keyed map: flatten every array-valued key
                let mut all = Vec::new();
                let mut saw_array = false;
                for (key, value) in map {
                    if let Value::Array(items) = value {
                        saw_array = true;
                        debug!(key, count = items.len(), "flattening catalog section");
                        all.extend(deserialize_components(items)?);
                    }
                }
                if !saw_array {
                    return Err(parse_error("no recognizable component arrays"));
                }
                Ok(Self::Categorized(all))
            }
            _ => Err(parse_error("catalog document is neither array nor object")),
        }
    }

    /// The component list regardless of layout
    pub fn into_components(self) -> Vec<RawComponent> {
        match self {
            Self::Flat(c) | Self::Wrapped(c) | Self::Categorized(c) => c,
        }
    }
}

fn deserialize_components(items: Vec<Value>) -> Result<Vec<RawComponent>> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| parse_error(&format!("bad component entry: {e}")))
        })
        .collect()
}

fn parse_error(detail: &str) -> Error {
    Error::provider("community-catalog", format!("catalog parse failed: {detail}"))
}

/// Fixed component-type to category table
///
/// Unknown types land in the pattern category.
pub fn category_for_type(component_type: &str) -> ResourceCategory {
    match component_type.to_lowercase().as_str() {
        "agent" => ResourceCategory::Agent,
        "skill" => ResourceCategory::Skill,
        "command" => ResourceCategory::Workflow,
        "template" => ResourceCategory::Example,
        "mcp" | "hook" | "setting" => ResourceCategory::Pattern,
        _ => ResourceCategory::Pattern,
    }
}
