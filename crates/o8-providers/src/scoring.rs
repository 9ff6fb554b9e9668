//! Component scoring for HTTP-backed providers
//!
//! The catalog and source-control providers score indexed components with
//! substring keyword matching over the catalog metadata, plus popularity,
//! validation, and size signals the local matcher does not have.

use o8_domain::constants::{LARGE_RESOURCE_TOKENS, SCORE_CAP, SMALL_RESOURCE_TOKENS};
use o8_domain::entities::ResourceMetadata;
use o8_domain::value_objects::SearchOptions;

/// Popularity and validation signals attached to a catalog component
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentSignals {
    /// Download counter reported by the backend
    pub downloads: u64,
    /// Validation score (0-100) when the backend publishes a valid record
    pub validation_score: Option<f64>,
}

/// Score one component against extracted query keywords
///
/// Returns `None` when a hard filter (category, required tags) fails;
/// otherwise the capped score plus up to three match reasons.
pub fn score_component(
    metadata: &ResourceMetadata,
    signals: ComponentSignals,
    keywords: &[String],
    options: &SearchOptions,
) -> Option<(u32, Vec<String>)> {
    // Category filter short-circuits
    if !options.categories.is_empty() && !options.categories.contains(&metadata.category) {
        return None;
    }

    // Required tags short-circuit
    if !options.required_tags.is_empty() {
        let has_all = options.required_tags.iter().all(|required| {
            metadata
                .tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(required))
        });
        if !has_all {
            return None;
        }
    }

    let mut score: i64 = 0;
    let mut reasons: Vec<String> = Vec::new();

    let name = metadata.id.to_lowercase();
    let title = metadata.title.to_lowercase();
    let description = metadata.description.to_lowercase();

    let mut name_hits: Vec<&str> = Vec::new();
    let mut tag_hits: Vec<&str> = Vec::new();

    for keyword in keywords {
        if name.contains(keyword.as_str()) || title.contains(keyword.as_str()) {
            score += 15;
            name_hits.push(keyword);
        }
        if description.contains(keyword.as_str()) {
            score += 8;
        }
        if metadata
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(keyword.as_str()))
        {
            score += 10;
            tag_hits.push(keyword);
        }
        if metadata
            .capabilities
            .iter()
            .any(|cap| cap.to_lowercase().contains(keyword.as_str()))
        {
            score += 8;
        }
        if metadata
            .use_when
            .iter()
            .any(|uw| uw.to_lowercase().contains(keyword.as_str()))
        {
            score += 5;
        }
    }

    if !options.categories.is_empty() {
        score += 15;
        reasons.push(format!("category match: {}", metadata.category));
    }
    if !options.required_tags.is_empty() {
        score += 10;
        reasons.push(format!(
            "required tags present: {}",
            options.required_tags.join(", ")
        ));
    }
    for optional in &options.optional_tags {
        if metadata
            .tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(optional))
        {
            score += 5;
        }
    }

    if signals.downloads > 1000 {
        score += 10;
    } else if signals.downloads > 100 {
        score += 5;
    }

    if let Some(validation) = signals.validation_score {
        score += ((validation / 20.0).clamp(0.0, 5.0)) as i64;
    }

    if metadata.estimated_tokens < SMALL_RESOURCE_TOKENS {
        score += 5;
    } else if metadata.estimated_tokens > LARGE_RESOURCE_TOKENS {
        score -= 5;
    }

    if !name_hits.is_empty() {
        reasons.insert(0, format!("name match: {}", name_hits.join(", ")));
    }
    if !tag_hits.is_empty() {
        reasons.push(format!("tag match: {}", tag_hits.join(", ")));
    }
    reasons.truncate(3);

    Some((score.clamp(0, i64::from(SCORE_CAP)) as u32, reasons))
}
