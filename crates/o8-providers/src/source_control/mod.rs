//! Source-control provider

pub mod provider;
pub mod repo_map;

pub use provider::{SourceControlProvider, SOURCE_CONTROL_PROVIDER_LABEL};
