//! Resource URI grammar
//!
//! A single-scheme URI format with two variants distinguished by the path:
//!
//! - Static: `o8://<category>/<resource-id>` — exactly two path segments,
//!   the id may not contain slashes.
//! - Match: `o8://[<category>/]match?<query-string>` — the literal segment
//!   `match` triggers query-based matching; parameters are URL-decoded
//!   `key=value` pairs.
//!
//! The scheme prefix is fixed per deployment and passed to the parser.

use crate::constants::{DEFAULT_MAX_RESULTS, DEFAULT_MAX_TOKENS, DEFAULT_MIN_SCORE};
use crate::entities::ResourceCategory;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Output shape of a dynamic match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Concatenated content of the selected fragments
    Full,
    /// Metadata entries without content (the default)
    #[default]
    Catalog,
    /// Catalog shape sorted by use-when relevance
    Index,
    /// Compact machine-readable records
    Minimal,
}

impl MatchMode {
    /// Parse a mode parameter value
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "full" => Ok(Self::Full),
            "catalog" => Ok(Self::Catalog),
            "index" => Ok(Self::Index),
            "minimal" => Ok(Self::Minimal),
            other => Err(Error::invalid_uri(format!("unknown mode '{other}'"))),
        }
    }

    /// Wire name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Catalog => "catalog",
            Self::Index => "index",
            Self::Minimal => "minimal",
        }
    }
}

/// Parameters of a dynamic match URI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchParams {
    /// Optional category restriction from the path segment
    pub category: Option<ResourceCategory>,
    /// Free-text input for matching (required)
    pub query: String,
    /// Upper bound on assembled content tokens
    pub max_tokens: u32,
    /// Cap on returned fragments
    pub max_results: usize,
    /// Score threshold below which results are discarded
    pub min_score: u32,
    /// Tags that must all be present
    pub required_tags: Vec<String>,
    /// Categories to restrict matching to
    pub categories: Vec<ResourceCategory>,
    /// Output shape
    pub mode: MatchMode,
}

impl MatchParams {
    /// Match params with defaults for everything but the query
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            category: None,
            query: query.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_results: DEFAULT_MAX_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
            required_tags: Vec::new(),
            categories: Vec::new(),
            mode: MatchMode::default(),
        }
    }
}

/// Parsed URI variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UriKind {
    /// Fetch-by-identity
    Static {
        /// Resource category
        category: ResourceCategory,
        /// Resource identifier (no slashes)
        id: String,
    },
    /// Query-based matching
    Match(MatchParams),
}

/// A parsed resource URI
///
/// Round-trips through [`ResourceUri::to_uri_string`] modulo
/// query-parameter ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUri {
    /// Scheme this URI was parsed under
    pub scheme: String,
    /// Static or match variant
    pub kind: UriKind,
}

impl ResourceUri {
    /// Parse a URI under the given scheme
    pub fn parse(input: &str, scheme: &str) -> Result<Self> {
        let prefix = format!("{scheme}://");
        let rest = input
            .strip_prefix(&prefix)
            .ok_or_else(|| Error::invalid_uri(format!("expected scheme '{scheme}://'")))?;

        let (path, query_string) = match rest.split_once('?') {
            Some((path, qs)) => (path, Some(qs)),
            None => (rest, None),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(Error::invalid_uri("missing path"));
        }

        let kind = match segments.as_slice() {
            ["match"] => UriKind::Match(Self::parse_match(None, query_string)?),
            [category, "match"] => {
                let category = ResourceCategory::parse(category)?;
                UriKind::Match(Self::parse_match(Some(category), query_string)?)
            }
            [category, id] => UriKind::Static {
                category: ResourceCategory::parse(category)?,
                id: (*id).to_string(),
            },
            [_single] => {
                return Err(Error::invalid_uri(
                    "static URIs need a category and a resource id",
                ));
            }
            _ => {
                return Err(Error::invalid_uri("resource id may not contain slashes"));
            }
        };

        Ok(Self {
            scheme: scheme.to_string(),
            kind,
        })
    }

    fn parse_match(
        category: Option<ResourceCategory>,
        query_string: Option<&str>,
    ) -> Result<MatchParams> {
        let mut query = None;
        let mut params = MatchParams::new(String::new());
        params.category = category;

        for pair in query_string.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = url_decode(value)?;
            match key {
                "query" => query = Some(value),
                "maxTokens" => params.max_tokens = parse_positive(key, &value)?,
                "maxResults" => params.max_results = parse_positive(key, &value)? as usize,
                "minScore" => {
                    let score: u32 = value
                        .parse()
                        .map_err(|_| Error::invalid_uri(format!("bad integer for '{key}'")))?;
                    if score > 100 {
                        return Err(Error::invalid_uri("minScore must be 0-100"));
                    }
                    params.min_score = score;
                }
                "tags" => {
                    params.required_tags = split_list(&value);
                }
                "categories" => {
                    params.categories = split_list(&value)
                        .iter()
                        .map(|c| ResourceCategory::parse(c))
                        .collect::<Result<Vec<_>>>()?;
                }
                "mode" => params.mode = MatchMode::parse(&value)?,
                // Unknown parameters are ignored, not rejected
                _ => {}
            }
        }

        params.query =
            query.ok_or_else(|| Error::invalid_uri("match URIs require a 'query' parameter"))?;
        Ok(params)
    }

    /// Serialize back to URI form
    pub fn to_uri_string(&self) -> String {
        match &self.kind {
            UriKind::Static { category, id } => {
                format!("{}://{}/{}", self.scheme, category.as_str(), id)
            }
            UriKind::Match(params) => {
                let mut out = String::new();
                out.push_str(&self.scheme);
                out.push_str("://");
                if let Some(category) = params.category {
                    out.push_str(category.as_str());
                    out.push('/');
                }
                out.push_str("match?query=");
                out.push_str(&url_encode(&params.query));
                if params.max_tokens != DEFAULT_MAX_TOKENS {
                    out.push_str(&format!("&maxTokens={}", params.max_tokens));
                }
                if params.max_results != DEFAULT_MAX_RESULTS {
                    out.push_str(&format!("&maxResults={}", params.max_results));
                }
                if params.min_score != DEFAULT_MIN_SCORE {
                    out.push_str(&format!("&minScore={}", params.min_score));
                }
                if !params.required_tags.is_empty() {
                    out.push_str("&tags=");
                    out.push_str(&url_encode(&params.required_tags.join(",")));
                }
                if !params.categories.is_empty() {
                    let joined = params
                        .categories
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push_str(&format!("&categories={joined}"));
                }
                if params.mode != MatchMode::default() {
                    out.push_str(&format!("&mode={}", params.mode.as_str()));
                }
                out
            }
        }
    }
}

impl std::fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_uri_string())
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    let parsed: u32 = value
        .parse()
        .map_err(|_| Error::invalid_uri(format!("bad integer for '{key}'")))?;
    if parsed == 0 {
        return Err(Error::invalid_uri(format!("'{key}' must be positive")));
    }
    Ok(parsed)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode percent-escapes and `+` in a query-string value
fn url_decode(value: &str) -> Result<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| Error::invalid_uri("truncated percent escape"))?;
                let hex = std::str::from_utf8(hex)
                    .map_err(|_| Error::invalid_uri("invalid percent escape"))?;
                let byte = u8::from_str_radix(hex, 16)
                    .map_err(|_| Error::invalid_uri("invalid percent escape"))?;
                out.push(byte);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| Error::invalid_uri("query value is not UTF-8"))
}

/// Percent-encode a query-string value
fn url_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_handles_escapes_and_plus() {
        assert_eq!(url_decode("a+b%20c").unwrap(), "a b c");
        assert_eq!(url_decode("100%25").unwrap(), "100%");
        assert!(url_decode("%2").is_err());
    }

    #[test]
    fn encode_decode_round_trip() {
        let original = "build typescript api & more";
        assert_eq!(url_decode(&url_encode(original)).unwrap(), original);
    }
}
