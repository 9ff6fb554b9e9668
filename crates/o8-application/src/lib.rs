//! Application layer for O8
//!
//! Orchestrates the domain: the fuzzy matcher that rewrites "load everything
//! relevant" into a scored, budgeted fragment selection; the three-tier
//! lookup engine over the prebuilt inverted index; and the provider registry
//! that composes backends, fans out searches, and monitors health.
//!
//! This crate depends only on `o8-domain`; concrete backends and
//! infrastructure are injected through the domain ports.

pub mod domain_services;
pub mod lookup;
pub mod use_cases;

pub use domain_services::matcher::{MatchRequest, MatchResult, ResourceMatcher, ScoredFragment};
pub use lookup::{LookupEngine, LookupOptions, LookupOutcome, LookupTier};
pub use use_cases::registry::{
    ProviderInfo, ProviderRegistry, ProviderState, RegistryConfig, ResourceResolution,
};
