//! Filesystem resource scanning
//!
//! Walks the fixed category directories under a resource root and parses
//! every `.md` file into a full resource. Shared by the local provider
//! (which runs one blocking scan per category concurrently) and the index
//! builder (which scans everything in one pass).

use crate::document::resource_from_content;
use o8_domain::entities::{Resource, ResourceCategory};
use o8_domain::error::Result;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Category directories scanned under the resource root
///
/// `guides` is an alias that lands in the pattern category.
pub const CATEGORY_DIRS: &[(&str, ResourceCategory)] = &[
    ("agents", ResourceCategory::Agent),
    ("skills", ResourceCategory::Skill),
    ("examples", ResourceCategory::Example),
    ("patterns", ResourceCategory::Pattern),
    ("workflows", ResourceCategory::Workflow),
    ("guides", ResourceCategory::Pattern),
];

/// Scan one category directory recursively
///
/// A missing directory is an empty result, not an error; unreadable files
/// are skipped with a warning.
pub fn scan_category(root: &Path, dir_name: &str, category: ResourceCategory) -> Vec<Resource> {
    let dir = root.join(dir_name);
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut resources = Vec::new();
    for entry in WalkDir::new(&dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let resource = resource_from_content(
                    &content,
                    stem,
                    category,
                    LOCAL_SOURCE,
                    &path.display().to_string(),
                );
                resources.push(resource);
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable resource file");
            }
        }
    }

    debug!(dir = dir_name, count = resources.len(), "scanned category directory");
    resources
}

/// Scan every category directory sequentially
pub fn scan_all(root: &Path) -> Result<Vec<Resource>> {
    // Surface an unreadable root as an I/O error; everything below is lenient
    std::fs::metadata(root)?;

    let mut resources = Vec::new();
    for (dir_name, category) in CATEGORY_DIRS {
        resources.extend(scan_category(root, dir_name, *category));
    }
    Ok(resources)
}

/// Source label for locally scanned resources
pub const LOCAL_SOURCE: &str = "local";

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_resource(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scans_nested_markdown_only() {
        let dir = tempfile::tempdir().unwrap();
        write_resource(
            dir.path(),
            "skills/code-exploration.md",
            "---\nid: code-exploration\n---\nbody",
        );
        write_resource(dir.path(), "skills/nested/deep.md", "deep body");
        write_resource(dir.path(), "skills/ignored.txt", "not markdown");

        let resources = scan_category(dir.path(), "skills", ResourceCategory::Skill);
        let mut ids: Vec<&str> = resources.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["code-exploration", "deep"]);
    }

    #[test]
    fn guides_alias_maps_to_pattern() {
        let dir = tempfile::tempdir().unwrap();
        write_resource(dir.path(), "guides/setup.md", "guide body");

        let resources = scan_all(dir.path()).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].category, ResourceCategory::Pattern);
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(scan_all(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn missing_category_dirs_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let resources = scan_all(dir.path()).unwrap();
        assert!(resources.is_empty());
    }
}
