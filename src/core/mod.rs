// Core algorithm exports
pub mod conversation;
pub mod engagement;
pub mod filters;
pub mod matcher;
pub mod performance;
pub mod preference;
pub mod scoring;
pub mod severity;
pub mod weights;

pub use conversation::{enhance, ScoringError};
pub use engagement::score_engagement;
pub use filters::{fuzzy_contains, fuzzy_match, fuzzy_overlap, overlap_ratio};
pub use matcher::{MatchError, Matcher, MatcherSettings, MatchingContext};
pub use performance::score_performance;
pub use preference::{score_preferences, StatedPreferenceScorer};
pub use scoring::{calculate_base_score, score_base, MissingPreAssessment};
pub use weights::{resolve_weights, WeightHints};
