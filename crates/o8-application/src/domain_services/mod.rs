//! Domain services

pub mod matcher;

pub use matcher::{MatchRequest, MatchResult, ResourceMatcher, ScoredFragment};
