//! Three-tier lookup engine
//!
//! Rewrites "load everything relevant" into a compact pointer list using the
//! prebuilt inverted index, escalating through three strategies:
//!
//! 1. **Quick** - a normalized-query cache of precomputed answers, valid for
//!    fifteen minutes.
//! 2. **Index** - keyword-map search over scenario entries; needs at least
//!    two matches to count, and stores its compact output back into the
//!    quick cache.
//! 3. **Fuzzy fallback** - the full matcher in catalog mode, used when the
//!    index yields too little (or the index is missing entirely).

use crate::domain_services::matcher::{MatchRequest, ResourceMatcher};
use o8_domain::constants::*;
use o8_domain::entities::{ResourceCategory, ResourceFragment};
use o8_domain::utils::keywords::extract_keywords;
use o8_domain::value_objects::lookup::{KeywordIndex, QuickLookup, ScenarioEntry, UseWhenIndex};
use o8_domain::value_objects::uri::MatchMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Lookup options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOptions {
    /// Cap on listed pointers
    pub max_results: usize,
    /// Score threshold for the fuzzy fallback
    pub min_score: u32,
    /// Restrict to these categories (empty = all)
    pub categories: Vec<ResourceCategory>,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_LOOKUP_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
            categories: Vec::new(),
        }
    }
}

/// Which tier answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupTier {
    /// Quick-lookup cache hit
    Quick,
    /// Keyword-index search
    Index,
    /// Full fuzzy matcher
    FuzzyFallback,
}

impl LookupTier {
    /// Metric label for the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Index => "index",
            Self::FuzzyFallback => "fuzzy-fallback",
        }
    }
}

/// Result of a lookup, with the metrics recorded for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome {
    /// Formatted pointer list (or fuzzy catalog output)
    pub text: String,
    /// Tier that produced the answer
    pub tier: LookupTier,
    /// Wall time of the lookup in milliseconds
    pub latency_ms: u64,
    /// Number of results in the answer
    pub result_count: usize,
    /// Approximate token cost of the response text
    pub approx_tokens: u32,
}

#[derive(Debug, Clone)]
struct QuickEntry {
    text: String,
    result_count: usize,
    cached_at: Instant,
}

/// Lookup engine over loaded index artifacts
///
/// Holds the scenario map, the keyword map, an in-memory quick cache, and
/// the fragment list that backs the fuzzy fallback.
pub struct LookupEngine {
    scenarios: BTreeMap<String, ScenarioEntry>,
    keywords: BTreeMap<String, Vec<String>>,
    quick: Mutex<HashMap<String, QuickEntry>>,
    fragments: Vec<ResourceFragment>,
    matcher: ResourceMatcher,
    scheme: String,
}

impl LookupEngine {
    /// Build an engine from loaded artifacts and the fallback corpus
    pub fn new(
        use_when: UseWhenIndex,
        keyword_index: KeywordIndex,
        quick_seed: Option<QuickLookup>,
        fragments: Vec<ResourceFragment>,
        scheme: impl Into<String>,
    ) -> Self {
        let now = Instant::now();
        let mut quick = HashMap::new();
        if let Some(seed) = quick_seed {
            for (normalized, entry) in seed.common_queries {
                let text = entry
                    .uris
                    .iter()
                    .map(|uri| format!("- {uri}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                quick.insert(
                    normalized,
                    QuickEntry {
                        result_count: entry.uris.len(),
                        text,
                        cached_at: now,
                    },
                );
            }
        }

        Self {
            scenarios: use_when.index,
            keywords: keyword_index.keywords,
            quick: Mutex::new(quick),
            fragments,
            matcher: ResourceMatcher::new(),
            scheme: scheme.into(),
        }
    }

    /// An engine with no prebuilt index: every lookup falls through to fuzzy
    pub fn without_index(fragments: Vec<ResourceFragment>, scheme: impl Into<String>) -> Self {
        Self {
            scenarios: BTreeMap::new(),
            keywords: BTreeMap::new(),
            quick: Mutex::new(HashMap::new()),
            fragments,
            matcher: ResourceMatcher::new(),
            scheme: scheme.into(),
        }
    }

    /// Resolve a query through the tiers
    pub fn lookup(&self, query: &str, options: &LookupOptions) -> LookupOutcome {
        let started = Instant::now();
        let normalized = normalize_query(query);

        // Tier 1: quick cache
        if let Some(entry) = self.quick_hit(&normalized) {
            let outcome = LookupOutcome {
                approx_tokens: (entry.text.len() / CHARS_PER_TOKEN) as u32,
                result_count: entry.result_count,
                text: entry.text,
                tier: LookupTier::Quick,
                latency_ms: started.elapsed().as_millis() as u64,
            };
            self.record(&outcome, query);
            return outcome;
        }

        // Tier 2: keyword-index search
        if let Some(outcome) = self.index_lookup(query, &normalized, options, started) {
            self.record(&outcome, query);
            return outcome;
        }

        // Tier 3: fuzzy fallback
        let mut request = MatchRequest::new(query);
        request.mode = MatchMode::Catalog;
        request.max_results = options.max_results.max(DEFAULT_LOOKUP_RESULTS);
        request.min_score = options.min_score;
        request.categories = options.categories.clone();
        request.scheme = self.scheme.clone();
        let result = self.matcher.match_resources(&request, &self.fragments);

        let outcome = LookupOutcome {
            approx_tokens: (result.assembled_content.len() / CHARS_PER_TOKEN) as u32,
            result_count: result.fragments.len(),
            text: result.assembled_content,
            tier: LookupTier::FuzzyFallback,
            latency_ms: started.elapsed().as_millis() as u64,
        };
        self.record(&outcome, query);
        outcome
    }

    fn quick_hit(&self, normalized: &str) -> Option<QuickEntry> {
        let quick = self.quick.lock().unwrap();
        quick
            .get(normalized)
            .filter(|entry| {
                entry.cached_at.elapsed() < Duration::from_secs(QUICK_LOOKUP_VALIDITY_SECS)
            })
            .cloned()
    }

    fn index_lookup(
        &self,
        query: &str,
        normalized: &str,
        options: &LookupOptions,
        started: Instant,
    ) -> Option<LookupOutcome> {
        let query_keywords = extract_keywords(query);
        if query_keywords.is_empty() {
            return None;
        }

        // Union of scenario hashes across all query keywords
        let mut hashes: HashSet<&str> = HashSet::new();
        for keyword in &query_keywords {
            if let Some(bucket) = self.keywords.get(keyword) {
                hashes.extend(bucket.iter().map(String::as_str));
            }
        }

        let mut matches: Vec<(&ScenarioEntry, u32)> = hashes
            .iter()
            .filter_map(|hash| self.scenarios.get(*hash))
            .filter(|entry| {
                options.categories.is_empty() || options.categories.contains(&entry.category)
            })
            .filter_map(|entry| {
                let score = score_scenario(entry, &query_keywords);
                (score > 0).then_some((entry, score))
            })
            .collect();

        if matches.len() < MIN_INDEX_MATCHES {
            return None;
        }

        matches.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.estimated_tokens.cmp(&b.0.estimated_tokens))
                .then_with(|| a.0.uri.cmp(&b.0.uri))
        });

        let text = format_compact(&matches, options.max_results);
        let result_count = matches.len().min(options.max_results);

        // Populate the quick cache for next time
        self.quick.lock().unwrap().insert(
            normalized.to_string(),
            QuickEntry {
                text: text.clone(),
                result_count,
                cached_at: Instant::now(),
            },
        );

        Some(LookupOutcome {
            approx_tokens: (text.len() / CHARS_PER_TOKEN) as u32,
            result_count,
            text,
            tier: LookupTier::Index,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn record(&self, outcome: &LookupOutcome, query: &str) {
        debug!(
            tier = outcome.tier.as_str(),
            latency_ms = outcome.latency_ms,
            results = outcome.result_count,
            approx_tokens = outcome.approx_tokens,
            query,
            "lookup resolved"
        );
    }
}

/// Normalize a query for quick-cache keys: lowercase, strip non-word
/// characters, collapse whitespace runs to single hyphens
pub fn normalize_query(query: &str) -> String {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Score a scenario: +20 per exact keyword hit, +10 per partial hit, partial
/// counted at most once per query keyword
pub fn score_scenario(entry: &ScenarioEntry, query_keywords: &[String]) -> u32 {
    let mut score = 0;
    for keyword in query_keywords {
        if entry.keywords.iter().any(|k| k == keyword) {
            score += SCORE_INDEX_EXACT;
        } else if entry
            .keywords
            .iter()
            .any(|k| k.contains(keyword.as_str()) || keyword.contains(k.as_str()))
        {
            score += SCORE_INDEX_PARTIAL;
        }
    }
    score
}

/// Compact pointer list, kept around 120 tokens
fn format_compact(matches: &[(&ScenarioEntry, u32)], max_results: usize) -> String {
    let mut out = String::new();
    for (entry, _score) in matches.iter().take(max_results) {
        let line = format!(
            "- [{}] {} (~{} tokens) {}\n",
            entry.category,
            scenario_name(entry),
            entry.estimated_tokens,
            entry.uri,
        );
        if (out.len() + line.len()) / CHARS_PER_TOKEN > COMPACT_OUTPUT_TOKENS as usize {
            break;
        }
        out.push_str(&line);
    }
    out.trim_end().to_string()
}

/// Display name: the resource id segment of the scenario's URI
fn scenario_name(entry: &ScenarioEntry) -> &str {
    entry.uri.rsplit('/').next().unwrap_or(&entry.uri)
}
