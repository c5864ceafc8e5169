use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw pre-assessment as stored for a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreAssessment {
    /// Questionnaires the client answered, in answer order
    #[serde(default)]
    pub questionnaires: Vec<String>,
    /// Questionnaire -> severity label
    #[serde(rename = "severityLevels", default)]
    pub severity_levels: BTreeMap<String, String>,
}

/// Preferences a client stated during onboarding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPreferences {
    #[serde(default)]
    pub approaches: Vec<String>,
    #[serde(rename = "sessionFormat", default)]
    pub session_format: Vec<String>,
    #[serde(rename = "sessionDuration", default)]
    pub session_duration: Vec<String>,
    #[serde(rename = "sessionFrequency", default)]
    pub session_frequency: Option<String>,
    #[serde(rename = "therapistAge", default)]
    pub therapist_age: Option<String>,
    #[serde(rename = "therapistGender", default)]
    pub therapist_gender: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(rename = "maxBudget", default)]
    pub max_budget: Option<f64>,
    /// One of `under-100`, `100-150`, `150-200`, `200-plus`, `insurance`
    #[serde(rename = "budgetRange", default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub insurance: Vec<String>,
}
