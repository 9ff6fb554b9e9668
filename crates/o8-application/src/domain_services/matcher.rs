//! Fuzzy resource matcher
//!
//! The core of dynamic loading: scores every fragment of a catalog against a
//! free-text query, drops the weak matches, and packs the strongest ones
//! into a token budget.
//!
//! # Pipeline
//!
//! ```text
//! Query
//!   |
//!   v
//! Keyword extraction (lowercase, stop words out)
//!   |
//!   v
//! Per-fragment scoring:
//!   exact hits     tag +15 / capability +12 / use-when +8
//!   fuzzy fallback best tier only, similarity >= 0.75, weight scaled
//!   phrase bonus   +20 when the whole query appears
//!   category +15, size +5/-5, capped at 100
//!   |
//!   v
//! Sort (score desc, tokens asc, id asc) -> greedy budget packing
//!   |
//!   v
//! Output by mode (full / catalog / index / minimal)
//! ```

use o8_domain::constants::*;
use o8_domain::entities::{ResourceCategory, ResourceFragment};
use o8_domain::utils::keywords::{extract_keywords, words};
use o8_domain::utils::similarity::similarity;
use o8_domain::value_objects::uri::{MatchMode, MatchParams};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// A match request, normalized from a dynamic URI or search options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    /// Free-text query
    pub query: String,
    /// Categories to restrict to (empty = all); a single-category request
    /// is folded in here
    pub categories: Vec<ResourceCategory>,
    /// Token budget for the selection
    pub max_tokens: u32,
    /// Tags that must all be present on a fragment
    pub required_tags: Vec<String>,
    /// Output shape
    pub mode: MatchMode,
    /// Cap on selected fragments
    pub max_results: usize,
    /// Score threshold
    pub min_score: u32,
    /// URI scheme used when rendering fragment URIs
    pub scheme: String,
}

impl MatchRequest {
    /// A request with defaults for everything but the query
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            categories: Vec::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            required_tags: Vec::new(),
            mode: MatchMode::default(),
            max_results: DEFAULT_MAX_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
            scheme: "o8".to_string(),
        }
    }
}

impl From<&MatchParams> for MatchRequest {
    fn from(params: &MatchParams) -> Self {
        let mut categories = params.categories.clone();
        if let Some(category) = params.category {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        Self {
            query: params.query.clone(),
            categories,
            max_tokens: params.max_tokens,
            required_tags: params.required_tags.clone(),
            mode: params.mode,
            max_results: params.max_results,
            min_score: params.min_score,
            scheme: "o8".to_string(),
        }
    }
}

/// A fragment with its match score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    /// The scored fragment
    pub fragment: ResourceFragment,
    /// Relevance score, 0-100
    pub score: u32,
}

/// Result of a match: the selected fragments and the formatted output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Selected fragments, strongest first
    pub fragments: Vec<ResourceFragment>,
    /// Scores parallel to `fragments`
    pub match_scores: Vec<u32>,
    /// Combined estimated tokens of the selection
    pub total_tokens: u32,
    /// Mode-formatted output
    pub assembled_content: String,
}

impl MatchResult {
    fn empty() -> Self {
        Self {
            fragments: Vec::new(),
            match_scores: Vec::new(),
            total_tokens: 0,
            assembled_content: String::new(),
        }
    }
}

/// Stateless fuzzy matcher over resource fragments
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceMatcher;

impl ResourceMatcher {
    /// Create a matcher
    pub fn new() -> Self {
        Self
    }

    /// Score, filter, pack, and format
    pub fn match_resources(
        &self,
        request: &MatchRequest,
        fragments: &[ResourceFragment],
    ) -> MatchResult {
        if request.query.trim().is_empty() {
            return MatchResult::empty();
        }

        let keywords = extract_keywords(&request.query);
        let query_lower = request.query.to_lowercase();

        let mut scored: Vec<ScoredFragment> = fragments
            .iter()
            .filter_map(|fragment| {
                let score = score_fragment(fragment, &keywords, &query_lower, request)?;
                if score < request.min_score {
                    return None;
                }
                Some(ScoredFragment {
                    fragment: fragment.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.fragment.estimated_tokens.cmp(&b.fragment.estimated_tokens))
                .then_with(|| a.fragment.id.cmp(&b.fragment.id))
        });

        let selected = pack_budget(&scored, request.max_tokens, request.max_results);
        let total_tokens: u32 = selected
            .iter()
            .map(|sf| sf.fragment.estimated_tokens)
            .sum();

        debug!(
            query = %request.query,
            candidates = scored.len(),
            selected = selected.len(),
            total_tokens,
            "fuzzy match complete"
        );

        let assembled_content = format_output(&selected, request, &keywords);
        MatchResult {
            match_scores: selected.iter().map(|sf| sf.score).collect(),
            fragments: selected.into_iter().map(|sf| sf.fragment).collect(),
            total_tokens,
            assembled_content,
        }
    }
}

/// Score one fragment; `None` when it fails the required-tags filter
fn score_fragment(
    fragment: &ResourceFragment,
    keywords: &[String],
    query_lower: &str,
    request: &MatchRequest,
) -> Option<u32> {
    // Required tags are a hard filter, independent of minScore
    if !request.required_tags.is_empty() {
        let has_all = request
            .required_tags
            .iter()
            .all(|required| fragment.tags.iter().any(|tag| tag.eq_ignore_ascii_case(required)));
        if !has_all {
            return None;
        }
    }

    let mut score: i64 = 0;

    for keyword in keywords {
        let tag_hit = fragment
            .tags
            .iter()
            .any(|tag| tag.to_lowercase() == *keyword);
        let capability_hit = fragment
            .capabilities
            .iter()
            .any(|cap| cap.to_lowercase().contains(keyword));
        let use_when_hit = fragment
            .use_when
            .iter()
            .any(|uw| uw.to_lowercase().contains(keyword));

        if tag_hit {
            score += i64::from(SCORE_TAG_MATCH);
        }
        if capability_hit {
            score += i64::from(SCORE_CAPABILITY_MATCH);
        }
        if use_when_hit {
            score += i64::from(SCORE_USE_WHEN_MATCH);
        }

        if !tag_hit && !capability_hit && !use_when_hit {
            score += i64::from(fuzzy_keyword_score(fragment, keyword));
        }
    }

    // Phrase bonus: the whole query appearing verbatim in the fragment text
    let haystack = fragment
        .tags
        .iter()
        .chain(fragment.capabilities.iter())
        .chain(fragment.use_when.iter())
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    if haystack.contains(query_lower) {
        score += i64::from(SCORE_PHRASE_BONUS);
    }

    if !request.categories.is_empty() && request.categories.contains(&fragment.category) {
        score += i64::from(SCORE_CATEGORY_MATCH);
    }

    if fragment.estimated_tokens < SMALL_RESOURCE_TOKENS {
        score += i64::from(SCORE_SMALL_BONUS);
    } else if fragment.estimated_tokens > LARGE_RESOURCE_TOKENS {
        score -= i64::from(SCORE_LARGE_PENALTY);
    }

    Some(score.clamp(0, i64::from(SCORE_CAP)) as u32)
}

/// Best fuzzy tier for one keyword that had no exact hit anywhere
fn fuzzy_keyword_score(fragment: &ResourceFragment, keyword: &str) -> u32 {
    let best_in = |texts: &[String]| -> f64 {
        texts
            .iter()
            .flat_map(|text| words(text))
            .map(|word| similarity(keyword, &word))
            .fold(0.0_f64, f64::max)
    };

    let tag_sim = best_in(&fragment.tags);
    let cap_sim = best_in(&fragment.capabilities);
    let uw_sim = best_in(&fragment.use_when);

    // One tier only: the strongest weighted candidate wins
    let mut best = 0u32;
    for (sim, weight) in [
        (tag_sim, SCORE_TAG_MATCH),
        (cap_sim, SCORE_CAPABILITY_MATCH),
        (uw_sim, SCORE_USE_WHEN_MATCH),
    ] {
        if sim >= FUZZY_SIMILARITY_THRESHOLD {
            let weighted = (f64::from(weight) * sim).round() as u32;
            best = best.max(weighted);
        }
    }
    best
}

/// Greedy budget packing with top-3 force-include
///
/// The top three scored fragments go in even past the budget, but never
/// beyond 150% of it and never when a single fragment alone exceeds it.
/// Everything after the top three must fit the plain budget.
fn pack_budget(scored: &[ScoredFragment], max_tokens: u32, max_results: usize) -> Vec<ScoredFragment> {
    let mut selected = Vec::new();
    let mut total: u64 = 0;
    let budget = u64::from(max_tokens);
    let force_ceiling = (max_tokens as f64 * FORCE_INCLUDE_BUDGET_FACTOR) as u64;

    for (rank, sf) in scored.iter().enumerate() {
        if selected.len() == max_results {
            break;
        }
        let tokens = u64::from(sf.fragment.estimated_tokens);
        let within_budget = total + tokens <= budget;
        let force = rank < FORCE_INCLUDE_TOP
            && tokens <= budget
            && total + tokens <= force_ceiling;

        if within_budget || force {
            total += tokens;
            selected.push(sf.clone());
        }
    }

    selected
}

/// A use-when-only relevance score, used by index mode ordering
fn use_when_score(fragment: &ResourceFragment, keywords: &[String]) -> u32 {
    let mut score = 0u32;
    for keyword in keywords {
        let exact = fragment
            .use_when
            .iter()
            .any(|uw| uw.to_lowercase().contains(keyword));
        if exact {
            score += SCORE_USE_WHEN_MATCH;
            continue;
        }
        let best: f64 = fragment
            .use_when
            .iter()
            .flat_map(|uw| words(uw))
            .map(|word| similarity(keyword, &word))
            .fold(0.0_f64, f64::max);
        if best >= FUZZY_SIMILARITY_THRESHOLD {
            score += (f64::from(SCORE_USE_WHEN_MATCH) * best).round() as u32;
        }
    }
    score
}

fn fragment_uri(fragment: &ResourceFragment, scheme: &str) -> String {
    // Fragment ids may already carry their category prefix
    let prefix = format!("{}/", fragment.category.as_str());
    let id = fragment.id.strip_prefix(&prefix).unwrap_or(&fragment.id);
    format!("{}://{}/{}", scheme, fragment.category.as_str(), id)
}

fn catalog_line(sf: &ScoredFragment, scheme: &str) -> String {
    let fragment = &sf.fragment;
    format!(
        "- {} [{}] tags: {} | capabilities: {} (~{} tokens) {}",
        fragment.id,
        fragment.category,
        fragment.tags.join(", "),
        fragment.capabilities.join(", "),
        fragment.estimated_tokens,
        fragment_uri(fragment, scheme),
    )
}

/// Render the selection in the requested output mode
fn format_output(selected: &[ScoredFragment], request: &MatchRequest, keywords: &[String]) -> String {
    match request.mode {
        MatchMode::Full => {
            // Content ordered by category priority, not score
            let mut ordered: Vec<&ScoredFragment> = selected.iter().collect();
            ordered.sort_by_key(|sf| {
                (
                    sf.fragment.category.assembly_rank(),
                    sf.fragment.id.clone(),
                )
            });
            ordered
                .iter()
                .map(|sf| {
                    format!(
                        "## [{}] {} (~{} tokens)\n\n{}",
                        sf.fragment.category,
                        sf.fragment.id,
                        sf.fragment.estimated_tokens,
                        sf.fragment.content,
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        }
        MatchMode::Catalog => selected
            .iter()
            .map(|sf| catalog_line(sf, &request.scheme))
            .collect::<Vec<_>>()
            .join("\n"),
        MatchMode::Index => {
            let mut ordered: Vec<&ScoredFragment> = selected.iter().collect();
            ordered.sort_by(|a, b| {
                use_when_score(&b.fragment, keywords)
                    .cmp(&use_when_score(&a.fragment, keywords))
                    .then_with(|| a.fragment.id.cmp(&b.fragment.id))
            });
            ordered
                .iter()
                .map(|sf| catalog_line(sf, &request.scheme))
                .collect::<Vec<_>>()
                .join("\n")
        }
        MatchMode::Minimal => {
            let records: Vec<serde_json::Value> = selected
                .iter()
                .map(|sf| {
                    json!({
                        "uri": fragment_uri(&sf.fragment, &request.scheme),
                        "score": sf.score,
                        "tokens": sf.fragment.estimated_tokens,
                        "tags": sf.fragment.tags.iter().take(3).collect::<Vec<_>>(),
                    })
                })
                .collect();
            serde_json::to_string(&records).unwrap_or_default()
        }
    }
}
