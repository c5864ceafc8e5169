use crate::core::filters::{fuzzy_contains, fuzzy_match, fuzzy_overlap};
use crate::core::scoring::to_score;
use crate::models::{ClientPreferences, PreferenceMatch, TherapistProfile, NEUTRAL_SCORE};
use crate::services::{PreferenceMatcher, SnapshotSource, SourceError};
use async_trait::async_trait;
use std::sync::Arc;

const NO_PREFERENCE: &str = "no-preference";

/// Score a therapist against the client's stated onboarding preferences
///
/// overall = round(
///     0.10 * gender + 0.10 * age + 0.20 * language + 0.25 * approach +
///     0.15 * session_format + 0.10 * budget + 0.10 * location
/// )
///
/// Therapist gender and age are not part of the profile, so those two
/// sub-scores stay neutral.
pub fn score_preferences(preferences: &ClientPreferences, therapist: &TherapistProfile) -> PreferenceMatch {
    let gender_match = NEUTRAL_SCORE;
    let age_match = NEUTRAL_SCORE;
    let language_match = language_match(preferences, therapist);
    let approach_match = approach_match(preferences, therapist);
    let session_format_match = session_format_match(preferences, therapist);
    let budget_match = budget_match(preferences, therapist);
    let location_match = location_match(preferences, therapist);

    let overall = 0.1 * gender_match as f64
        + 0.1 * age_match as f64
        + 0.2 * language_match as f64
        + 0.25 * approach_match as f64
        + 0.15 * session_format_match as f64
        + 0.1 * budget_match as f64
        + 0.1 * location_match as f64;

    PreferenceMatch {
        gender_match,
        age_match,
        language_match,
        approach_match,
        session_format_match,
        budget_match,
        location_match,
        overall_score: to_score(overall),
    }
}

fn language_match(preferences: &ClientPreferences, therapist: &TherapistProfile) -> u8 {
    let stated = &preferences.languages;
    if stated.is_empty() {
        return NEUTRAL_SCORE;
    }

    let matched = fuzzy_overlap(stated, &therapist.languages_offered).len();
    to_score(100.0 * matched as f64 / stated.len() as f64)
}

fn approach_match(preferences: &ClientPreferences, therapist: &TherapistProfile) -> u8 {
    let stated = &preferences.approaches;
    if stated.is_empty() {
        return NEUTRAL_SCORE;
    }

    let matched = fuzzy_overlap(stated, therapist.all_approaches()).len();
    to_score(100.0 * matched as f64 / stated.len() as f64)
}

/// Synonyms a therapist may list for a client-facing session format
fn format_synonyms(format: &str) -> Vec<&str> {
    match format {
        "in-person" => vec!["in-person", "in_person", "onsite"],
        "video" => vec!["video", "online", "virtual", "telehealth"],
        "phone" => vec!["phone", "telephone", "call"],
        other => vec![other],
    }
}

fn session_format_match(preferences: &ClientPreferences, therapist: &TherapistProfile) -> u8 {
    let stated: Vec<&String> = preferences
        .session_format
        .iter()
        .filter(|format| format.as_str() != NO_PREFERENCE)
        .collect();
    if stated.is_empty() {
        return NEUTRAL_SCORE;
    }

    let offered = stated.iter().any(|format| {
        format_synonyms(format)
            .into_iter()
            .any(|synonym| fuzzy_contains(&therapist.accept_types, synonym))
    });

    if offered {
        100
    } else {
        0
    }
}

/// Upper rate for each budget band
fn budget_ceiling(band: &str) -> Option<f64> {
    match band {
        "under-100" => Some(100.0),
        "100-150" => Some(150.0),
        "150-200" => Some(200.0),
        "200-plus" => Some(10_000.0),
        _ => None,
    }
}

fn budget_match(preferences: &ClientPreferences, therapist: &TherapistProfile) -> u8 {
    let band = match preferences.budget_range.as_deref() {
        None | Some("insurance") => {
            return if therapist.accepts_insurance { 100 } else { NEUTRAL_SCORE };
        }
        Some(band) => band,
    };

    let Some(ceiling) = budget_ceiling(band) else {
        return NEUTRAL_SCORE;
    };

    let rate = therapist.hourly_rate_f64();
    if rate <= ceiling * 0.8 {
        100
    } else if rate <= ceiling {
        80
    } else if rate <= ceiling * 1.2 {
        30
    } else {
        0
    }
}

fn location_match(preferences: &ClientPreferences, therapist: &TherapistProfile) -> u8 {
    let Some(location) = &preferences.location else {
        return NEUTRAL_SCORE;
    };

    match &therapist.province {
        Some(province) if fuzzy_match(province, location) => 100,
        _ => 0,
    }
}

/// Default [`PreferenceMatcher`]: loads stated preferences and scores them
///
/// A client without stated preferences gets the neutral result.
pub struct StatedPreferenceScorer {
    source: Arc<dyn SnapshotSource>,
}

impl StatedPreferenceScorer {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl PreferenceMatcher for StatedPreferenceScorer {
    async fn match_preference(
        &self,
        client_id: &str,
        therapist: &TherapistProfile,
    ) -> Result<Option<PreferenceMatch>, SourceError> {
        let preferences = self.source.load_client_preferences(client_id).await?;

        Ok(Some(match preferences {
            Some(preferences) => score_preferences(&preferences, therapist),
            None => PreferenceMatch::neutral(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ClientRecord, InMemorySource};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn therapist(rate: i64) -> TherapistProfile {
        TherapistProfile {
            id: "t1".to_string(),
            expertise: vec![],
            illness_specializations: vec![],
            approaches: vec!["CBT".into()],
            therapeutic_approaches_used_list: vec!["Mindfulness".into()],
            accept_types: vec!["online".into(), "in_person".into()],
            languages_offered: vec!["English".into(), "Tagalog".into()],
            province: Some("British Columbia".into()),
            hourly_rate: Decimal::from(rate),
            years_of_experience: 4,
            accepts_insurance: true,
            accepted_insurance_types: vec![],
            treatment_success_rates: BTreeMap::new(),
            reviews: vec![],
        }
    }

    #[test]
    fn test_no_preferences_is_mostly_neutral() {
        let result = score_preferences(&ClientPreferences::default(), &therapist(100));

        assert_eq!(result.language_match, 50);
        assert_eq!(result.approach_match, 50);
        assert_eq!(result.session_format_match, 50);
        // No band stated and the therapist takes insurance
        assert_eq!(result.budget_match, 100);
        assert_eq!(result.location_match, 50);
    }

    #[test]
    fn test_stated_preferences() {
        let preferences = ClientPreferences {
            approaches: vec!["CBT".into(), "mindfulness".into(), "EMDR".into(), "DBT".into()],
            session_format: vec!["video".into()],
            languages: vec!["tagalog".into()],
            budget_range: Some("100-150".into()),
            location: Some("columbia".into()),
            ..Default::default()
        };

        let result = score_preferences(&preferences, &therapist(130));

        assert_eq!(result.language_match, 100);
        assert_eq!(result.approach_match, 50);
        assert_eq!(result.session_format_match, 100);
        assert_eq!(result.budget_match, 80);
        assert_eq!(result.location_match, 100);
        // 5 + 5 + 20 + 12.5 + 15 + 8 + 10, rounded
        assert!((75..=76).contains(&result.overall_score));
    }

    #[test]
    fn test_budget_bands() {
        let preferences = |band: &str| ClientPreferences {
            budget_range: Some(band.to_string()),
            ..Default::default()
        };

        assert_eq!(budget_match(&preferences("under-100"), &therapist(70)), 100);
        assert_eq!(budget_match(&preferences("under-100"), &therapist(110)), 30);
        assert_eq!(budget_match(&preferences("under-100"), &therapist(150)), 0);
        assert_eq!(budget_match(&preferences("sliding"), &therapist(150)), 50);
    }

    #[tokio::test]
    async fn test_stated_preference_scorer() {
        let source: Arc<dyn SnapshotSource> = Arc::new(
            InMemorySource::new()
                .with_client(ClientRecord {
                    id: "c1".into(),
                    ..Default::default()
                }),
        );
        let scorer = StatedPreferenceScorer::new(source);

        let result = scorer.match_preference("c1", &therapist(100)).await.unwrap();
        assert_eq!(result, Some(PreferenceMatch::neutral()));

        let missing = scorer.match_preference("nobody", &therapist(100)).await;
        assert!(matches!(missing, Err(SourceError::NotFound(_))));
    }
}
