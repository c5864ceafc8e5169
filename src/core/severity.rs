use crate::models::{
    ClientConditionProfile, ClientPreferences, ConditionEntry, Demographics, LogisticsPreferences,
    PreAssessment, SessionPreferences, Severity,
};

/// Weight at or above which a condition is primary
pub const PRIMARY_WEIGHT: u8 = 4;
/// Weight at or above which a condition is secondary (below primary)
pub const SECONDARY_WEIGHT: u8 = 2;

impl Severity {
    /// Parse a questionnaire severity label
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Minimal" => Severity::Minimal,
            "Mild" => Severity::Mild,
            "Moderate" => Severity::Moderate,
            "Moderately Severe" => Severity::ModeratelySevere,
            "Severe" => Severity::Severe,
            "Very Severe" => Severity::VerySevere,
            "Extreme" => Severity::Extreme,
            "Low" => Severity::Low,
            "High" => Severity::High,
            "Substantial" => Severity::Substantial,
            "Subclinical" => Severity::Subclinical,
            "Clinical" => Severity::Clinical,
            "Subthreshold" => Severity::Subthreshold,
            "Positive" => Severity::Positive,
            "Negative" => Severity::Negative,
            "None" => Severity::None,
            _ => Severity::Unrecognized,
        }
    }

    /// Fixed, non-linear severity weight (0-5)
    pub fn weight(self) -> u8 {
        match self {
            Severity::Minimal => 1,
            Severity::Mild => 2,
            Severity::Moderate => 3,
            Severity::ModeratelySevere => 4,
            Severity::Severe | Severity::VerySevere | Severity::Extreme => 5,
            Severity::Low => 1,
            Severity::High | Severity::Substantial => 4,
            Severity::Subclinical => 1,
            Severity::Clinical => 4,
            Severity::Subthreshold => 2,
            Severity::Positive => 4,
            Severity::Negative | Severity::None => 0,
            Severity::Unrecognized => 1,
        }
    }
}

/// Where a condition of the given weight lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTier {
    Primary,
    Secondary,
    Ignored,
}

#[inline]
pub fn classify(weight: u8) -> ConditionTier {
    if weight >= PRIMARY_WEIGHT {
        ConditionTier::Primary
    } else if weight >= SECONDARY_WEIGHT {
        ConditionTier::Secondary
    } else {
        ConditionTier::Ignored
    }
}

impl ClientConditionProfile {
    /// Build the matching profile from a pre-assessment and stated preferences
    ///
    /// Questionnaires without a severity label are treated as unrecognized
    /// (weight 1) and therefore ignored.
    pub fn from_assessment(assessment: &PreAssessment, preferences: &ClientPreferences) -> Self {
        let mut primary_conditions = Vec::new();
        let mut secondary_conditions = Vec::new();

        for condition in &assessment.questionnaires {
            let severity = assessment
                .severity_levels
                .get(condition)
                .map(|label| Severity::from_label(label))
                .unwrap_or(Severity::Unrecognized);
            let weight = severity.weight();

            let entry = ConditionEntry {
                condition: condition.clone(),
                severity,
                weight,
            };

            match classify(weight) {
                ConditionTier::Primary => primary_conditions.push(entry),
                ConditionTier::Secondary => secondary_conditions.push(entry),
                ConditionTier::Ignored => {}
            }
        }

        Self {
            primary_conditions,
            secondary_conditions,
            preferred_approaches: preferences.approaches.clone(),
            session_preferences: SessionPreferences {
                format: or_default(&preferences.session_format, &["online", "in-person"]),
                duration: preferences.session_duration.clone(),
                frequency: preferences
                    .session_frequency
                    .clone()
                    .unwrap_or_else(|| "weekly".to_string()),
            },
            demographics: Demographics {
                age_range: preferences
                    .therapist_age
                    .clone()
                    .unwrap_or_else(|| "any".to_string()),
                gender_preference: preferences.therapist_gender.clone(),
                language_preference: or_default(&preferences.languages, &["English"]),
            },
            logistics: LogisticsPreferences {
                max_hourly_rate: preferences.max_budget,
                province: preferences.location.clone(),
                insurance_types: preferences.insurance.clone(),
            },
        }
    }
}

fn or_default(values: &[String], fallback: &[&str]) -> Vec<String> {
    if values.is_empty() {
        fallback.iter().map(|v| v.to_string()).collect()
    } else {
        values.to_vec()
    }
}
