//! Repository directory classification
//!
//! Known repositories declare which top-level directories hold which
//! categories; everything else goes through the singular/plural name
//! heuristic. Files whose directory classifies to nothing are skipped.

use o8_domain::entities::ResourceCategory;

/// Directory layouts of repositories the federation knows about
const KNOWN_REPOSITORIES: &[(&str, &[(&str, ResourceCategory)])] = &[
    (
        "gobrucego/o8-resources",
        &[
            ("agents", ResourceCategory::Agent),
            ("skills", ResourceCategory::Skill),
            ("examples", ResourceCategory::Example),
            ("patterns", ResourceCategory::Pattern),
            ("workflows", ResourceCategory::Workflow),
            ("guides", ResourceCategory::Pattern),
        ],
    ),
    (
        "awesome-claude/prompt-library",
        &[
            ("prompts", ResourceCategory::Pattern),
            ("agents", ResourceCategory::Agent),
            ("snippets", ResourceCategory::Example),
        ],
    ),
];

/// Classify a repository path's top-level directory to a category
///
/// Known repositories use their declared layout; unknown repositories fall
/// back to parsing the directory name as a category (singular or plural).
pub fn classify_path(repo: &str, path: &str) -> Option<ResourceCategory> {
    let top_dir = path.split('/').next()?;
    // A bare filename at the repo root classifies to nothing
    if top_dir == path {
        return None;
    }

    if let Some((_, layout)) = KNOWN_REPOSITORIES.iter().find(|(name, _)| *name == repo) {
        return layout
            .iter()
            .find(|(dir, _)| *dir == top_dir)
            .map(|(_, category)| *category);
    }

    ResourceCategory::parse(top_dir).ok()
}
