use serde::{Deserialize, Serialize};

/// Neutral value every optional scorer falls back to when its inputs are missing
pub const NEUTRAL_SCORE: u8 = 50;

/// The five static sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub condition_score: u8,
    pub approach_score: u8,
    pub experience_score: u8,
    pub review_score: u8,
    pub logistics_score: u8,
}

/// Why a base score came out the way it did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchExplanation {
    pub primary_matches: Vec<String>,
    pub secondary_matches: Vec<String>,
    pub approach_matches: Vec<String>,
    pub experience_years: u32,
    pub average_rating: f64,
    pub total_reviews: usize,
}

/// Output of the base compatibility scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseScore {
    pub total_score: u8,
    pub breakdown: ScoreBreakdown,
    pub explanation: MatchExplanation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationFactors {
    /// 0-15
    pub sentiment_alignment: u8,
    /// 0-20
    pub mentioned_conditions_match: u8,
    /// 0-15
    pub preference_alignment: u8,
    /// 0-10
    pub communication_style_match: u8,
    /// min(60, sum of the above)
    pub total: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationExplanation {
    pub condition_matches: Vec<String>,
    pub preference_matches: Vec<String>,
}

/// Base score after conversation signals were blended in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedScore {
    /// max(base total, enhanced total)
    pub total_score: u8,
    pub enhanced_total: u8,
    pub breakdown: ScoreBreakdown,
    pub factors: ConversationFactors,
    pub explanation: ConversationExplanation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMatch {
    pub engagement_compatibility: u8,
    pub retention_match: u8,
    pub session_time_match: u8,
    pub overall_score: u8,
}

impl EngagementMatch {
    pub const fn neutral() -> Self {
        Self {
            engagement_compatibility: NEUTRAL_SCORE,
            retention_match: NEUTRAL_SCORE,
            session_time_match: NEUTRAL_SCORE,
            overall_score: NEUTRAL_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMatch {
    pub success_rate_match: u8,
    pub workload_match: u8,
    pub availability_match: u8,
    pub communication_style_match: u8,
    pub overall_score: u8,
}

impl PerformanceMatch {
    pub const fn neutral() -> Self {
        Self {
            success_rate_match: NEUTRAL_SCORE,
            workload_match: NEUTRAL_SCORE,
            availability_match: NEUTRAL_SCORE,
            communication_style_match: NEUTRAL_SCORE,
            overall_score: NEUTRAL_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceMatch {
    pub gender_match: u8,
    pub age_match: u8,
    pub language_match: u8,
    pub approach_match: u8,
    pub session_format_match: u8,
    pub budget_match: u8,
    pub location_match: u8,
    pub overall_score: u8,
}

impl PreferenceMatch {
    pub const fn neutral() -> Self {
        Self {
            gender_match: NEUTRAL_SCORE,
            age_match: NEUTRAL_SCORE,
            language_match: NEUTRAL_SCORE,
            approach_match: NEUTRAL_SCORE,
            session_format_match: NEUTRAL_SCORE,
            budget_match: NEUTRAL_SCORE,
            location_match: NEUTRAL_SCORE,
            overall_score: NEUTRAL_SCORE,
        }
    }
}

/// Final, explainable score for one (client, therapist) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub therapist_id: String,
    /// Always equal to `comprehensive_score`
    pub total_score: u8,
    /// Recombined static score, max(base total, conversation-enhanced total)
    pub base_score: u8,
    pub breakdown: ScoreBreakdown,
    pub explanation: MatchExplanation,
    pub conversation_factors: Option<ConversationFactors>,
    pub conversation_explanation: Option<ConversationExplanation>,
    pub engagement_match: Option<EngagementMatch>,
    pub performance_match: Option<PerformanceMatch>,
    pub preference_match: Option<PreferenceMatch>,
    pub comprehensive_score: u8,
}

/// A candidate that could not be scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateError {
    pub candidate_id: String,
    pub error: String,
}

/// Ranked results plus the candidates that failed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub results: Vec<MatchResult>,
    pub errors: Vec<CandidateError>,
}
