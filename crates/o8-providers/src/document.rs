//! Document-to-resource assembly
//!
//! Shared by every provider: takes raw file content, parses the metadata
//! preamble, and fills in the defaults the data model requires (token
//! estimate, lowercased tags, fallback identifier and title).

use o8_domain::entities::{estimate_tokens, Resource, ResourceCategory};
use o8_domain::utils::frontmatter::parse_document;

/// Build a full resource from raw document content
///
/// `fallback_id` (usually the file stem) applies when the preamble carries
/// no `id`; the preamble's own `category` wins over the caller's when it
/// parses.
pub fn resource_from_content(
    content: &str,
    fallback_id: &str,
    category: ResourceCategory,
    source: &str,
    source_uri: &str,
) -> Resource {
    let doc = parse_document(content);
    let preamble = &doc.preamble;

    let id = preamble
        .scalar("id")
        .unwrap_or(fallback_id)
        .to_string();
    let category = preamble
        .scalar("category")
        .and_then(|c| ResourceCategory::parse(c).ok())
        .unwrap_or(category);
    let title = preamble
        .scalar("title")
        .unwrap_or(&id)
        .to_string();
    let estimated_tokens = preamble
        .positive_int("estimatedTokens")
        .unwrap_or_else(|| estimate_tokens(&doc.body));

    Resource {
        title,
        description: preamble.scalar("description").unwrap_or_default().to_string(),
        tags: preamble
            .string_list("tags")
            .iter()
            .map(|t| t.to_lowercase())
            .collect(),
        capabilities: preamble.string_list("capabilities"),
        use_when: preamble.string_list("useWhen"),
        estimated_tokens,
        version: preamble.scalar("version").map(str::to_string),
        author: preamble.scalar("author").map(str::to_string),
        created_at: preamble.timestamp("createdAt"),
        updated_at: preamble.timestamp("updatedAt"),
        source: source.to_string(),
        source_uri: source_uri.to_string(),
        dependencies: preamble.string_list("dependencies"),
        related: preamble.string_list("related"),
        content: doc.body,
        id,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_fields_win_over_fallbacks() {
        let content = "---\nid: real-id\ntitle: Real Title\ncategory: pattern\nestimatedTokens: 42\ntags:\n  - Async\n  - API\n---\nbody";
        let resource = resource_from_content(
            content,
            "file-stem",
            ResourceCategory::Skill,
            "local",
            "/tmp/x.md",
        );
        assert_eq!(resource.id, "real-id");
        assert_eq!(resource.title, "Real Title");
        assert_eq!(resource.category, ResourceCategory::Pattern);
        assert_eq!(resource.estimated_tokens, 42);
        assert_eq!(resource.tags, vec!["async", "api"]);
        assert_eq!(resource.content, "body");
    }

    #[test]
    fn missing_preamble_falls_back_everywhere() {
        let body = "plain content with no preamble at all";
        let resource =
            resource_from_content(body, "stem", ResourceCategory::Example, "local", "x");
        assert_eq!(resource.id, "stem");
        assert_eq!(resource.title, "stem");
        assert_eq!(resource.category, ResourceCategory::Example);
        assert_eq!(resource.estimated_tokens, estimate_tokens(body));
        assert!(resource.tags.is_empty());
    }
}
