//! Provider implementations for O8
//!
//! Three backends implement the [`ResourceProvider`] contract: a local
//! filesystem tree, a community HTTP catalog, and user-configured
//! source-control repositories. The offline inverted-index builder lives
//! here too because it reuses the local scan machinery.
//!
//! [`ResourceProvider`]: o8_domain::ports::providers::ResourceProvider

pub mod catalog;
pub mod document;
pub mod index;
pub mod local;
pub mod scoring;
pub mod source_control;

pub use catalog::CatalogProvider;
pub use index::builder::{BuiltIndex, IndexBuilder};
pub use local::LocalProvider;
pub use source_control::SourceControlProvider;
