//! Tiered index lookup

pub mod engine;

pub use engine::{
    normalize_query, score_scenario, LookupEngine, LookupOptions, LookupOutcome, LookupTier,
};
