//! Metadata preamble parser
//!
//! Resource files begin with a delimited key/value block:
//!
//! ```text
//! ---
//! id: code-exploration
//! title: Code Exploration
//! tags:
//!   - typescript
//!   - async
//! estimatedTokens: 740
//! ---
//! body text...
//! ```
//!
//! Values are either inline scalars (`key: value`) or a bare `key:` followed
//! by indented list items. Unknown keys are preserved but ignored; a file
//! without a preamble parses to an empty preamble and the full content as
//! body.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Preamble delimiter line
const DELIMITER: &str = "---";

fn key_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*):\s*(.*)$").unwrap())
}

/// Parsed key/value preamble
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Preamble {
    scalars: BTreeMap<String, String>,
    lists: BTreeMap<String, Vec<String>>,
}

impl Preamble {
    /// True when no keys were parsed
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.lists.is_empty()
    }

    /// Scalar value for a key
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.scalars.get(key).map(String::as_str)
    }

    /// List value for a key
    ///
    /// Falls back to splitting an inline scalar on commas, so both the
    /// indented-list and `tags: a, b, c` spellings work.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        if let Some(items) = self.lists.get(key) {
            return items.clone();
        }
        match self.scalars.get(key) {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Positive integer value for a key
    pub fn positive_int(&self, key: &str) -> Option<u32> {
        self.scalar(key)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
    }

    /// Timestamp value for a key (RFC 3339, or a bare date at midnight UTC)
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        let value = self.scalar(key)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// A resource file split into preamble and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Parsed metadata preamble
    pub preamble: Preamble,
    /// Everything after the closing delimiter
    pub body: String,
}

/// Split a resource file into preamble and body
pub fn parse_document(content: &str) -> ParsedDocument {
    let mut lines = content.lines();

    // No preamble: whole content is the body
    if lines.next().map(str::trim_end) != Some(DELIMITER) {
        return ParsedDocument {
            preamble: Preamble::default(),
            body: content.to_string(),
        };
    }

    let mut preamble = Preamble::default();
    let mut current_list: Option<String> = None;
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in lines {
        if in_body {
            body_lines.push(line);
            continue;
        }
        if line.trim_end() == DELIMITER {
            in_body = true;
            continue;
        }

        // Indented list item under the most recent bare key
        let is_indented = line.starts_with(' ') || line.starts_with('\t');
        if is_indented {
            if let Some(key) = &current_list {
                let item = line.trim().trim_start_matches('-').trim();
                if !item.is_empty() {
                    preamble.lists.entry(key.clone()).or_default().push(item.to_string());
                }
                continue;
            }
        }

        if let Some(caps) = key_line_re().captures(line.trim_end()) {
            let key = caps[1].to_string();
            let value = caps[2].trim().to_string();
            if value.is_empty() {
                current_list = Some(key);
            } else {
                current_list = None;
                preamble.scalars.insert(key, value);
            }
        } else {
            // Malformed line inside the preamble: skip it, keep parsing
            current_list = None;
        }
    }

    // Unterminated preamble: treat the whole file as body
    if !in_body {
        return ParsedDocument {
            preamble: Preamble::default(),
            body: content.to_string(),
        };
    }

    ParsedDocument {
        preamble,
        body: body_lines.join("\n").trim_start_matches('\n').to_string(),
    }
}
