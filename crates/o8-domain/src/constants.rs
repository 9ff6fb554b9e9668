//! Shared constants for the federation core
//!
//! Scoring weights, default limits, and cache/retry defaults live here so the
//! matcher, the lookup engine, and the providers agree on the same numbers.

/// Characters per estimated token when a resource does not declare a count
pub const CHARS_PER_TOKEN: usize = 4;

// ---------------------------------------------------------------------------
// Match defaults (dynamic URIs and search options)
// ---------------------------------------------------------------------------

/// Default token budget for assembled match output
pub const DEFAULT_MAX_TOKENS: u32 = 3000;

/// Default cap on returned fragments
pub const DEFAULT_MAX_RESULTS: usize = 15;

/// Default score threshold below which results are discarded
pub const DEFAULT_MIN_SCORE: u32 = 10;

// ---------------------------------------------------------------------------
// Fuzzy-match scoring weights
// ---------------------------------------------------------------------------

/// Score for an exact keyword occurrence in the tag set
pub const SCORE_TAG_MATCH: u32 = 15;

/// Score for an exact keyword occurrence in a capability string
pub const SCORE_CAPABILITY_MATCH: u32 = 12;

/// Score for an exact keyword occurrence in a use-when string
pub const SCORE_USE_WHEN_MATCH: u32 = 8;

/// Bonus when the whole query appears as a phrase in the fragment text
pub const SCORE_PHRASE_BONUS: u32 = 20;

/// Bonus for an explicit category match
pub const SCORE_CATEGORY_MATCH: u32 = 15;

/// Bonus for fragments under [`SMALL_RESOURCE_TOKENS`]
pub const SCORE_SMALL_BONUS: u32 = 5;

/// Penalty for fragments over [`LARGE_RESOURCE_TOKENS`]
pub const SCORE_LARGE_PENALTY: u32 = 5;

/// Ceiling applied to every final score
pub const SCORE_CAP: u32 = 100;

/// Minimum Levenshtein similarity for the fuzzy fallback to count
pub const FUZZY_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Token count under which a fragment earns the small-resource bonus
pub const SMALL_RESOURCE_TOKENS: u32 = 1000;

/// Token count over which a fragment takes the large-resource penalty
pub const LARGE_RESOURCE_TOKENS: u32 = 5000;

/// Fragments force-included at the top of budget packing
pub const FORCE_INCLUDE_TOP: usize = 3;

/// Force-include may run the budget up to this multiple of max tokens
pub const FORCE_INCLUDE_BUDGET_FACTOR: f64 = 1.5;

// ---------------------------------------------------------------------------
// Index-lookup tiers
// ---------------------------------------------------------------------------

/// Default result cap for index lookups
pub const DEFAULT_LOOKUP_RESULTS: usize = 5;

/// Quick-lookup cache entries are valid for this many seconds
pub const QUICK_LOOKUP_VALIDITY_SECS: u64 = 15 * 60;

/// Approximate token ceiling for the compact tier-2 output
pub const COMPACT_OUTPUT_TOKENS: u32 = 120;

/// Minimum tier-2 match count before falling back to fuzzy matching
pub const MIN_INDEX_MATCHES: usize = 2;

/// Score for an exact keyword hit in a scenario's keyword list
pub const SCORE_INDEX_EXACT: u32 = 20;

/// Score for a partial (substring either way) keyword hit
pub const SCORE_INDEX_PARTIAL: u32 = 10;

// ---------------------------------------------------------------------------
// Provider defaults
// ---------------------------------------------------------------------------

/// Local provider resource-cache capacity
pub const LOCAL_CACHE_SIZE: usize = 200;

/// Local provider resource-cache TTL in seconds (4 hours)
pub const LOCAL_CACHE_TTL_SECS: u64 = 4 * 60 * 60;

/// Local provider index TTL in seconds (24 hours)
pub const LOCAL_INDEX_TTL_SECS: u64 = 24 * 60 * 60;

/// HTTP provider index TTL in seconds (24 hours)
pub const HTTP_INDEX_TTL_SECS: u64 = 24 * 60 * 60;

/// HTTP provider resource-cache capacity
pub const HTTP_RESOURCE_CACHE_SIZE: usize = 500;

/// HTTP provider resource-cache TTL in seconds (7 days)
pub const HTTP_RESOURCE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default outbound request deadline in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default retry attempts for transient HTTP failures
pub const HTTP_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential retry backoff, in milliseconds
pub const HTTP_BACKOFF_BASE_MS: u64 = 1000;

/// Ceiling for a single backoff delay, in milliseconds
pub const HTTP_BACKOFF_CAP_MS: u64 = 60_000;

/// Maximum jitter fraction added to a backoff delay
pub const HTTP_BACKOFF_JITTER: f64 = 0.30;

/// Priority of the community-catalog provider (lower runs first)
pub const CATALOG_PRIORITY: i32 = 10;

/// Priority of source-control providers
pub const SOURCE_CONTROL_PRIORITY: i32 = 20;

/// Rolling window length for response-time averaging
pub const RESPONSE_TIME_WINDOW: usize = 100;

/// Tags reported in local index statistics
pub const TOP_TAGS_LOCAL: usize = 20;

// ---------------------------------------------------------------------------
// Registry defaults
// ---------------------------------------------------------------------------

/// Default interval between health-check ticks, in milliseconds
pub const HEALTH_CHECK_INTERVAL_MS: u64 = 60_000;

/// Consecutive health-check failures before auto-disable
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Success rate at or above which a provider reports healthy
pub const HEALTHY_SUCCESS_RATE: f64 = 0.9;

/// Success rate below which a provider reports unhealthy
pub const UNHEALTHY_SUCCESS_RATE: f64 = 0.5;

/// Window for the "recent error" degradation signal, in seconds
pub const RECENT_ERROR_WINDOW_SECS: u64 = 5 * 60;
