use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

/// Severity label reported by a pre-assessment questionnaire
///
/// The label-to-weight lookup lives in `core::severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Minimal,
    Mild,
    Moderate,
    #[serde(rename = "Moderately Severe")]
    ModeratelySevere,
    Severe,
    #[serde(rename = "Very Severe")]
    VerySevere,
    Extreme,
    Low,
    High,
    Substantial,
    Subclinical,
    Clinical,
    Subthreshold,
    Positive,
    Negative,
    None,
    Unrecognized,
}

/// One classified condition from the client's latest pre-assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub condition: String,
    pub severity: Severity,
    pub weight: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPreferences {
    pub format: Vec<String>,
    pub duration: Vec<String>,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(rename = "ageRange")]
    pub age_range: String,
    #[serde(rename = "genderPreference", default)]
    pub gender_preference: Option<String>,
    #[serde(rename = "languagePreference", default)]
    pub language_preference: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsPreferences {
    #[serde(rename = "maxHourlyRate", default)]
    pub max_hourly_rate: Option<f64>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(rename = "insuranceTypes", default)]
    pub insurance_types: Vec<String>,
}

/// Client condition profile, snapshotted once per matching run
///
/// Primary conditions carry weight >= 4, secondary 2..4. The split is made
/// once in `core::severity` and never recomputed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConditionProfile {
    #[serde(rename = "primaryConditions")]
    pub primary_conditions: Vec<ConditionEntry>,
    #[serde(rename = "secondaryConditions")]
    pub secondary_conditions: Vec<ConditionEntry>,
    #[serde(rename = "preferredApproaches", default)]
    pub preferred_approaches: Vec<String>,
    #[serde(rename = "sessionPreferences")]
    pub session_preferences: SessionPreferences,
    pub demographics: Demographics,
    pub logistics: LogisticsPreferences,
}

impl ClientConditionProfile {
    /// Primary conditions followed by secondary conditions
    pub fn all_conditions(&self) -> impl Iterator<Item = &ConditionEntry> + Clone {
        self.primary_conditions
            .iter()
            .chain(self.secondary_conditions.iter())
    }

    pub fn condition_count(&self) -> usize {
        self.primary_conditions.len() + self.secondary_conditions.len()
    }
}

/// A single review left for a therapist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub rating: u8,
    #[serde(default = "default_true")]
    pub approved: bool,
}

fn default_true() -> bool { true }

/// Therapist profile as seen by the scorers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TherapistProfile {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(rename = "illnessSpecializations", default)]
    pub illness_specializations: Vec<String>,
    #[serde(default)]
    pub approaches: Vec<String>,
    #[serde(rename = "therapeuticApproachesUsedList", default)]
    pub therapeutic_approaches_used_list: Vec<String>,
    #[serde(rename = "acceptTypes", default)]
    pub accept_types: Vec<String>,
    #[serde(rename = "languagesOffered", default)]
    pub languages_offered: Vec<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(rename = "hourlyRate")]
    #[validate(custom(function = "validate_hourly_rate"))]
    pub hourly_rate: Decimal,
    #[serde(rename = "yearsOfExperience", default)]
    pub years_of_experience: u32,
    #[serde(rename = "acceptsInsurance", default)]
    pub accepts_insurance: bool,
    #[serde(rename = "acceptedInsuranceTypes", default)]
    pub accepted_insurance_types: Vec<String>,
    /// Condition -> success percentage (0-100)
    #[serde(rename = "treatmentSuccessRates", default)]
    pub treatment_success_rates: BTreeMap<String, f64>,
    #[serde(default)]
    pub reviews: Vec<ReviewSummary>,
}

impl TherapistProfile {
    /// Expertise followed by illness specializations
    pub fn conditions(&self) -> impl Iterator<Item = &String> + Clone {
        self.expertise.iter().chain(self.illness_specializations.iter())
    }

    /// Approaches followed by the therapeutic approaches used list
    pub fn all_approaches(&self) -> impl Iterator<Item = &String> + Clone {
        self.approaches
            .iter()
            .chain(self.therapeutic_approaches_used_list.iter())
    }

    pub fn approach_count(&self) -> usize {
        self.approaches.len() + self.therapeutic_approaches_used_list.len()
    }

    pub fn hourly_rate_f64(&self) -> f64 {
        self.hourly_rate.to_f64().unwrap_or(0.0)
    }

    pub fn approved_ratings(&self) -> impl Iterator<Item = u8> + '_ {
        self.reviews.iter().filter(|r| r.approved).map(|r| r.rating)
    }
}

fn validate_hourly_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() {
        return Err(ValidationError::new("negative_hourly_rate"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    pub fn is_urgent(self) -> bool {
        matches!(self, UrgencyLevel::High | UrgencyLevel::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyIndicators {
    pub level: UrgencyLevel,
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TherapyPreferences {
    #[serde(default)]
    pub approaches: Vec<String>,
    #[serde(default)]
    pub format: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationLogistics {
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CulturalNeeds {
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Signals extracted from the client's chatbot conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAnalysisResult {
    #[serde(rename = "urgencyIndicators")]
    pub urgency_indicators: UrgencyIndicators,
    #[serde(rename = "mentionedConditions", default)]
    pub mentioned_conditions: Vec<String>,
    #[serde(rename = "therapyPreferences", default)]
    pub therapy_preferences: TherapyPreferences,
    #[serde(rename = "logisticsPreferences", default)]
    pub logistics_preferences: ConversationLogistics,
    #[serde(rename = "culturalNeeds", default)]
    pub cultural_needs: CulturalNeeds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementTrend {
    Increasing,
    #[default]
    Stable,
    Decreasing,
}

/// Client platform engagement snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEngagementAnalysis {
    #[serde(rename = "engagementLevel")]
    pub engagement_level: EngagementLevel,
    #[serde(rename = "meetingAttendanceRate")]
    pub meeting_attendance_rate: f64,
    #[serde(rename = "platformUsageScore")]
    pub platform_usage_score: f64,
    #[serde(rename = "preferredSessionTimes", default)]
    pub preferred_session_times: Vec<String>,
    #[serde(rename = "engagementTrend", default)]
    pub engagement_trend: EngagementTrend,
}

/// Communication style traits, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommunicationStyle {
    pub warmth: f64,
    pub directness: f64,
    pub structure: f64,
    pub flexibility: f64,
}

impl Default for CommunicationStyle {
    fn default() -> Self {
        Self {
            warmth: 0.5,
            directness: 0.5,
            structure: 0.5,
            flexibility: 0.5,
        }
    }
}

/// Therapist historical performance snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapistPerformanceAnalysis {
    /// Minutes, absent when the therapist has no message history
    #[serde(rename = "averageResponseTime", default)]
    pub average_response_time: Option<f64>,
    #[serde(rename = "clientRetentionRate")]
    pub client_retention_rate: f64,
    #[serde(rename = "noShowRate")]
    pub no_show_rate: f64,
    #[serde(rename = "cancellationRate")]
    pub cancellation_rate: f64,
    #[serde(rename = "workloadCapacity")]
    pub workload_capacity: f64,
    #[serde(rename = "availabilityUtilization")]
    pub availability_utilization: f64,
    #[serde(rename = "successRatesByCondition", default)]
    pub success_rates_by_condition: BTreeMap<String, f64>,
    #[serde(rename = "communicationStyle", default)]
    pub communication_style: CommunicationStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSentimentAnalysis {
    #[serde(rename = "overallSentiment")]
    pub overall_sentiment: Sentiment,
}

/// Coefficients for the weighted recombination
///
/// Not required to sum to 1; the comprehensive score is clamped instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct MatchingWeights {
    #[serde(rename = "conditionMatch")]
    #[validate(range(min = 0.0))]
    pub condition_match: f64,
    #[serde(rename = "approachCompatibility")]
    #[validate(range(min = 0.0))]
    pub approach_compatibility: f64,
    #[serde(rename = "experienceAndSuccess")]
    #[validate(range(min = 0.0))]
    pub experience_and_success: f64,
    #[serde(rename = "reviewsAndRatings")]
    #[validate(range(min = 0.0))]
    pub reviews_and_ratings: f64,
    #[serde(rename = "availabilityAndLogistics")]
    #[validate(range(min = 0.0))]
    pub availability_and_logistics: f64,
    #[serde(rename = "engagementCompatibility")]
    #[validate(range(min = 0.0))]
    pub engagement_compatibility: f64,
    #[serde(rename = "performanceMatch")]
    #[validate(range(min = 0.0))]
    pub performance_match: f64,
    #[serde(rename = "preferenceMatch")]
    #[validate(range(min = 0.0))]
    pub preference_match: f64,
}

impl MatchingWeights {
    pub fn sum(&self) -> f64 {
        self.condition_match
            + self.approach_compatibility
            + self.experience_and_success
            + self.reviews_and_ratings
            + self.availability_and_logistics
            + self.engagement_compatibility
            + self.performance_match
            + self.preference_match
    }
}

impl Default for MatchingWeights {
    fn default() -> Self {
        Self {
            condition_match: 0.30,
            approach_compatibility: 0.18,
            experience_and_success: 0.15,
            reviews_and_ratings: 0.07,
            availability_and_logistics: 0.05,
            engagement_compatibility: 0.10,
            performance_match: 0.10,
            preference_match: 0.05,
        }
    }
}
