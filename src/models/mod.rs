// Model exports
pub mod assessment;
pub mod domain;
pub mod results;

pub use assessment::{ClientPreferences, PreAssessment};
pub use domain::{
    ClientConditionProfile, ClientEngagementAnalysis, CommunicationStyle, ConditionEntry,
    ConversationAnalysisResult, ConversationLogistics, CulturalNeeds, Demographics,
    EngagementLevel, EngagementTrend, LogisticsPreferences, MatchingWeights, ReviewSentimentAnalysis,
    ReviewSummary, Sentiment, SessionPreferences, Severity, TherapistPerformanceAnalysis,
    TherapistProfile, TherapyPreferences, UrgencyIndicators, UrgencyLevel,
};
pub use results::{
    BaseScore, BatchOutcome, CandidateError, ConversationExplanation, ConversationFactors,
    EngagementMatch, EnhancedScore, MatchExplanation, MatchResult, PerformanceMatch,
    PreferenceMatch, ScoreBreakdown, NEUTRAL_SCORE,
};
