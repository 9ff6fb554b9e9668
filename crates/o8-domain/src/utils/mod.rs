//! Pure text utilities
//!
//! The metadata preamble parser, the keyword extractor, and the edit-distance
//! routines that scoring is built on. Nothing here performs I/O.

pub mod frontmatter;
pub mod keywords;
pub mod similarity;

pub use frontmatter::{parse_document, ParsedDocument, Preamble};
pub use keywords::{extract_keywords, words};
pub use similarity::{levenshtein, similarity};
