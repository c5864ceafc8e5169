use crate::models::{EngagementLevel, MatchingWeights, UrgencyLevel};

/// Weights for clients flagged high or critical urgency in conversation
pub const URGENT_WEIGHTS: MatchingWeights = MatchingWeights {
    condition_match: 0.35,
    approach_compatibility: 0.15,
    experience_and_success: 0.20,
    reviews_and_ratings: 0.05,
    availability_and_logistics: 0.05,
    engagement_compatibility: 0.05,
    performance_match: 0.12,
    preference_match: 0.03,
};

/// Weights for clients without any engagement history
pub const NEW_CLIENT_WEIGHTS: MatchingWeights = MatchingWeights {
    condition_match: 0.30,
    approach_compatibility: 0.20,
    experience_and_success: 0.15,
    reviews_and_ratings: 0.10,
    availability_and_logistics: 0.05,
    engagement_compatibility: 0.0,
    performance_match: 0.10,
    preference_match: 0.10,
};

/// Weights for low-engagement clients: retention-oriented therapists count more
pub const LOW_ENGAGEMENT_WEIGHTS: MatchingWeights = MatchingWeights {
    condition_match: 0.28,
    approach_compatibility: 0.15,
    experience_and_success: 0.13,
    reviews_and_ratings: 0.07,
    availability_and_logistics: 0.05,
    engagement_compatibility: 0.15,
    performance_match: 0.12,
    preference_match: 0.05,
};

/// Weights for highly engaged clients: stated preferences count more
pub const HIGH_ENGAGEMENT_WEIGHTS: MatchingWeights = MatchingWeights {
    condition_match: 0.30,
    approach_compatibility: 0.20,
    experience_and_success: 0.15,
    reviews_and_ratings: 0.07,
    availability_and_logistics: 0.05,
    engagement_compatibility: 0.08,
    performance_match: 0.08,
    preference_match: 0.07,
};

/// Contextual hints used to pick a weight preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightHints {
    pub urgency: Option<UrgencyLevel>,
    pub engagement: Option<EngagementLevel>,
    pub is_new_client: bool,
}

/// Select the weight vector for a client
///
/// Urgency wins over everything, then the new-client preset, then the
/// engagement presets. Anything else gets `MatchingWeights::default()`.
pub fn resolve_weights(hints: WeightHints) -> MatchingWeights {
    if hints.urgency.is_some_and(UrgencyLevel::is_urgent) {
        return URGENT_WEIGHTS;
    }

    if hints.is_new_client {
        return NEW_CLIENT_WEIGHTS;
    }

    match hints.engagement {
        Some(EngagementLevel::Low) => LOW_ENGAGEMENT_WEIGHTS,
        Some(EngagementLevel::High) => HIGH_ENGAGEMENT_WEIGHTS,
        Some(EngagementLevel::Medium) | None => MatchingWeights::default(),
    }
}
