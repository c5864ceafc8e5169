//! Therapist Match - multi-signal scoring and ranking engine for therapist matching
//!
//! This library scores candidate therapists against a client by combining a
//! static compatibility score with conversation, engagement, performance and
//! stated-preference signals. Any of the behavioural signals may be missing or
//! failing; the engine degrades to neutral values instead of giving up.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{MatchError, Matcher, MatcherSettings, MatchingContext};
pub use models::{
    BatchOutcome, ClientConditionProfile, MatchResult, MatchingWeights, TherapistProfile,
};
pub use services::{InMemorySource, SnapshotSource, SourceError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let weights = MatchingWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert_eq!(MatcherSettings::default().max_concurrency, 8);
    }
}
