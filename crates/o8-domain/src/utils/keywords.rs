//! Keyword extraction
//!
//! Normalizes free text into a deduplicated keyword set: lowercase, strip
//! punctuation (hyphens survive), split on whitespace, drop short tokens and
//! stop words. The stop-word list is fixed; scoring is deterministic only if
//! every component uses the same list.

use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Closed-class words excluded from keyword sets
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "so", "in", "on", "at", "to", "for", "of", "with",
    "by", "from", "as", "into", "about", "over", "is", "are", "was", "were", "be", "do", "does",
    "did", "have", "has", "had", "can", "could", "will", "would", "should", "may", "must", "i",
    "you", "it", "we", "they", "this", "that", "these",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Extract a deduplicated, lowercased keyword list from free text
///
/// Order of first occurrence is preserved.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut keywords = Vec::new();
    for token in normalized.split_whitespace() {
        if token.len() < 2 || is_stop_word(token) {
            continue;
        }
        if seen.insert(token) {
            keywords.push(token.to_string());
        }
    }
    keywords
}

/// Split text into lowercase words for word-level fuzzy comparison
pub fn words(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let keywords = extract_keywords("Build a TypeScript API for the server");
        assert_eq!(keywords, vec!["build", "typescript", "api", "server"]);
    }

    #[test]
    fn deduplicates_preserving_first_occurrence() {
        let keywords = extract_keywords("cache the cache, CACHE everything");
        assert_eq!(keywords, vec!["cache", "everything"]);
    }

    #[test]
    fn hyphens_survive_normalization() {
        let keywords = extract_keywords("rate-limit handling");
        assert_eq!(keywords, vec!["rate-limit", "handling"]);
    }

    #[test]
    fn punctuation_becomes_separators() {
        let keywords = extract_keywords("async/await; error.handling!");
        assert_eq!(keywords, vec!["async", "await", "error", "handling"]);
    }

    #[test]
    fn empty_input_yields_no_keywords() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("a an the").is_empty());
    }
}
