use crate::core::filters::{fuzzy_contains, fuzzy_match, fuzzy_overlap, overlap_ratio};
use crate::models::{
    BaseScore, ClientConditionProfile, MatchExplanation, MatchingWeights, ScoreBreakdown,
    TherapistProfile, NEUTRAL_SCORE,
};
use thiserror::Error;

/// Approaches credited when the client has not stated any preference
const EVIDENCE_BASED_APPROACHES: [&str; 5] = [
    "Cognitive Behavioral Therapy (CBT)",
    "Dialectical Behavior Therapy (DBT)",
    "Acceptance and Commitment Therapy (ACT)",
    "Eye Movement Desensitization and Reprocessing (EMDR)",
    "Mindfulness-Based Cognitive Therapy (MBCT)",
];

const PROVINCE_MISMATCH_PENALTY: f64 = 30.0;
const OVER_BUDGET_PENALTY: f64 = 40.0;
const INSURANCE_MISMATCH_PENALTY: f64 = 20.0;
const LANGUAGE_MISMATCH_PENALTY: f64 = 25.0;

/// The client has no condition profile, so there is nothing to score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("client has no pre-assessment")]
pub struct MissingPreAssessment;

/// Round and clamp a raw score into [0, 100]
#[inline]
pub(crate) fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Calculate the static compatibility score (0-100) between a client and a therapist
///
/// Scoring formula:
/// score = round(
///     condition_score * w.condition_match +
///     approach_score * w.approach_compatibility +
///     experience_score * w.experience_and_success +
///     review_score * w.reviews_and_ratings +
///     logistics_score * w.availability_and_logistics
/// )
///
/// Fails only when the client has no condition profile at all.
pub fn score_base(
    profile: Option<&ClientConditionProfile>,
    therapist: &TherapistProfile,
    weights: &MatchingWeights,
) -> Result<BaseScore, MissingPreAssessment> {
    let profile = profile.ok_or(MissingPreAssessment)?;
    Ok(calculate_base_score(profile, therapist, weights))
}

/// Infallible core of [`score_base`]
pub fn calculate_base_score(
    profile: &ClientConditionProfile,
    therapist: &TherapistProfile,
    weights: &MatchingWeights,
) -> BaseScore {
    let condition = calculate_condition_score(profile, therapist);
    let approach = calculate_approach_score(profile, therapist);
    let experience = calculate_experience_score(profile, therapist);
    let review = calculate_review_score(therapist);
    let logistics = calculate_logistics_score(profile, therapist);

    let total = condition * weights.condition_match
        + approach * weights.approach_compatibility
        + experience * weights.experience_and_success
        + review * weights.reviews_and_ratings
        + logistics * weights.availability_and_logistics;

    BaseScore {
        total_score: to_score(total),
        breakdown: ScoreBreakdown {
            condition_score: to_score(condition),
            approach_score: to_score(approach),
            experience_score: to_score(experience),
            review_score: to_score(review),
            logistics_score: to_score(logistics),
        },
        explanation: build_explanation(profile, therapist),
    }
}

/// Share of the client's classified conditions the therapist covers (0-100)
fn calculate_condition_score(profile: &ClientConditionProfile, therapist: &TherapistProfile) -> f64 {
    let total = profile.condition_count();
    if total == 0 {
        return NEUTRAL_SCORE as f64;
    }

    let matched = profile
        .all_conditions()
        .filter(|entry| fuzzy_contains(therapist.conditions(), &entry.condition))
        .count();

    100.0 * matched as f64 / total as f64
}

/// Share of preferred approaches offered, or evidence-based credit when none are stated
///
/// Both cases add 2 points per listed approach, up to 20, before capping at 100.
fn calculate_approach_score(profile: &ClientConditionProfile, therapist: &TherapistProfile) -> f64 {
    let score = if !profile.preferred_approaches.is_empty() {
        100.0 * overlap_ratio(&profile.preferred_approaches, therapist.all_approaches())
    } else {
        let evidence_based = therapist
            .all_approaches()
            .filter(|approach| {
                EVIDENCE_BASED_APPROACHES
                    .iter()
                    .any(|known| fuzzy_match(known, approach))
            })
            .count();

        (evidence_based as f64 * 20.0).min(80.0)
    };

    let diversity_bonus = (therapist.all_approaches().count() as f64 * 2.0).min(20.0);

    (score + diversity_bonus).min(100.0)
}

/// Experience on a diminishing-returns curve plus a success-rate bonus
///
/// 0-5 years earn 8 points a year, 5-10 years 6 a year, beyond that 2 a year
/// up to 20 more. Documented success rates for the client's conditions add
/// up to 20 points.
fn calculate_experience_score(profile: &ClientConditionProfile, therapist: &TherapistProfile) -> f64 {
    let years = therapist.years_of_experience as f64;

    let mut score = if years <= 5.0 {
        years * 8.0
    } else if years <= 10.0 {
        40.0 + (years - 5.0) * 6.0
    } else {
        70.0 + ((years - 10.0) * 2.0).min(20.0)
    };

    let rates: Vec<f64> = profile
        .all_conditions()
        .filter_map(|entry| therapist.treatment_success_rates.get(&entry.condition))
        .copied()
        .collect();

    if !rates.is_empty() {
        let average = rates.iter().sum::<f64>() / rates.len() as f64;
        score += (average / 100.0) * 20.0;
    }

    score.min(100.0)
}

/// Approved review average mapped to 0-100, with a volume bonus
fn calculate_review_score(therapist: &TherapistProfile) -> f64 {
    let ratings: Vec<u8> = therapist.approved_ratings().collect();
    if ratings.is_empty() {
        return NEUTRAL_SCORE as f64;
    }

    let count = ratings.len();
    let average = ratings.iter().map(|&r| r as f64).sum::<f64>() / count as f64;

    let mut score = ((average - 1.0) / 4.0) * 100.0;
    score += (count as f64 * 2.0).min(20.0);

    // Too few reviews to trust
    if count < 3 {
        score *= 0.8;
    }

    score.clamp(0.0, 100.0)
}

/// Start from 100 and deduct for each logistics mismatch
fn calculate_logistics_score(profile: &ClientConditionProfile, therapist: &TherapistProfile) -> f64 {
    let mut score = 100.0;
    let logistics = &profile.logistics;

    if let Some(province) = &logistics.province {
        let same_province = therapist
            .province
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(province));
        if !same_province {
            score -= PROVINCE_MISMATCH_PENALTY;
        }
    }

    if let Some(max_rate) = logistics.max_hourly_rate.filter(|rate| *rate > 0.0) {
        if therapist.hourly_rate_f64() > max_rate {
            score -= OVER_BUDGET_PENALTY;
        }
    }

    if !logistics.insurance_types.is_empty() && therapist.accepts_insurance {
        let insurance_match = logistics
            .insurance_types
            .iter()
            .any(|kind| fuzzy_contains(&therapist.accepted_insurance_types, kind));
        if !insurance_match {
            score -= INSURANCE_MISMATCH_PENALTY;
        }
    }

    let default_languages = vec!["English".to_string()];
    let offered = if therapist.languages_offered.is_empty() {
        &default_languages
    } else {
        &therapist.languages_offered
    };
    let language_match = profile
        .demographics
        .language_preference
        .iter()
        .any(|lang| fuzzy_contains(offered, lang));
    if !language_match {
        score -= LANGUAGE_MISMATCH_PENALTY;
    }

    f64::max(score, 0.0)
}

fn build_explanation(profile: &ClientConditionProfile, therapist: &TherapistProfile) -> MatchExplanation {
    let matches = |entries: &[crate::models::ConditionEntry]| -> Vec<String> {
        entries
            .iter()
            .filter(|entry| fuzzy_contains(therapist.conditions(), &entry.condition))
            .map(|entry| entry.condition.clone())
            .collect()
    };

    let ratings: Vec<u8> = therapist.approved_ratings().collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        let average = ratings.iter().map(|&r| r as f64).sum::<f64>() / ratings.len() as f64;
        (average * 10.0).round() / 10.0
    };

    MatchExplanation {
        primary_matches: matches(&profile.primary_conditions),
        secondary_matches: matches(&profile.secondary_conditions),
        approach_matches: fuzzy_overlap(&profile.preferred_approaches, therapist.all_approaches()),
        experience_years: therapist.years_of_experience,
        average_rating,
        total_reviews: ratings.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClientPreferences, PreAssessment, ReviewSummary,
    };
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn create_test_profile() -> ClientConditionProfile {
        let assessment = PreAssessment {
            questionnaires: vec!["Depression".into(), "Anxiety".into()],
            severity_levels: BTreeMap::from([
                ("Depression".to_string(), "Severe".to_string()),
                ("Anxiety".to_string(), "Moderate".to_string()),
            ]),
        };
        let preferences = ClientPreferences {
            approaches: vec!["CBT".into()],
            languages: vec!["English".into()],
            max_budget: Some(150.0),
            location: Some("Ontario".into()),
            ..Default::default()
        };
        ClientConditionProfile::from_assessment(&assessment, &preferences)
    }

    fn create_test_therapist() -> TherapistProfile {
        TherapistProfile {
            id: "t1".to_string(),
            expertise: vec!["Depression".into()],
            illness_specializations: vec!["Social Anxiety".into()],
            approaches: vec!["Cognitive Behavioral Therapy (CBT)".into()],
            therapeutic_approaches_used_list: vec![],
            accept_types: vec!["online".into()],
            languages_offered: vec!["English".into()],
            province: Some("Ontario".into()),
            hourly_rate: Decimal::from(120),
            years_of_experience: 8,
            accepts_insurance: false,
            accepted_insurance_types: vec![],
            treatment_success_rates: BTreeMap::new(),
            reviews: vec![],
        }
    }

    #[test]
    fn test_missing_profile_is_fatal() {
        let therapist = create_test_therapist();
        let result = score_base(None, &therapist, &MatchingWeights::default());
        assert_eq!(result, Err(MissingPreAssessment));
    }

    #[test]
    fn test_full_condition_and_approach_match() {
        let profile = create_test_profile();
        let therapist = create_test_therapist();

        let score = calculate_base_score(&profile, &therapist, &MatchingWeights::default());

        assert_eq!(score.breakdown.condition_score, 100);
        assert_eq!(score.breakdown.approach_score, 100);
        assert_eq!(score.breakdown.logistics_score, 100);
        assert_eq!(score.explanation.primary_matches, vec!["Depression"]);
        assert_eq!(score.explanation.secondary_matches, vec!["Anxiety"]);
        assert!(score.total_score <= 100);
    }

    #[test]
    fn test_condition_ratio() {
        let profile = create_test_profile();
        let mut therapist = create_test_therapist();
        therapist.illness_specializations.clear();

        let score = calculate_base_score(&profile, &therapist, &MatchingWeights::default());

        assert_eq!(score.breakdown.condition_score, 50);
    }

    #[test]
    fn test_experience_curve() {
        let profile = create_test_profile();
        let mut therapist = create_test_therapist();

        therapist.years_of_experience = 3;
        assert_eq!(calculate_experience_score(&profile, &therapist), 24.0);

        therapist.years_of_experience = 8;
        assert_eq!(calculate_experience_score(&profile, &therapist), 58.0);

        therapist.years_of_experience = 40;
        assert_eq!(calculate_experience_score(&profile, &therapist), 90.0);

        therapist
            .treatment_success_rates
            .insert("Depression".to_string(), 80.0);
        assert_eq!(calculate_experience_score(&profile, &therapist), 100.0);
    }

    #[test]
    fn test_review_score() {
        let mut therapist = create_test_therapist();
        assert_eq!(calculate_review_score(&therapist), 50.0);

        therapist.reviews = vec![
            ReviewSummary { rating: 5, approved: true },
            ReviewSummary { rating: 5, approved: true },
            ReviewSummary { rating: 1, approved: false },
        ];
        // Two approved 5-star reviews: (100 + 4) * 0.8
        assert!((calculate_review_score(&therapist) - 83.2).abs() < 1e-9);
    }

    #[test]
    fn test_logistics_penalties() {
        let profile = create_test_profile();
        let mut therapist = create_test_therapist();
        therapist.province = Some("Quebec".into());
        therapist.hourly_rate = Decimal::from(200);
        therapist.languages_offered = vec!["French".into()];

        assert_eq!(calculate_logistics_score(&profile, &therapist), 5.0);
    }

    #[test]
    fn test_unlisted_languages_default_to_english() {
        let profile = create_test_profile();
        let mut therapist = create_test_therapist();
        therapist.languages_offered.clear();

        assert_eq!(calculate_logistics_score(&profile, &therapist), 100.0);
    }

    #[test]
    fn test_zero_max_rate_is_not_a_budget() {
        let mut profile = create_test_profile();
        profile.logistics.max_hourly_rate = Some(0.0);
        let therapist = create_test_therapist();

        assert_eq!(calculate_logistics_score(&profile, &therapist), 100.0);
    }

    #[test]
    fn test_evidence_based_fallback() {
        let mut profile = create_test_profile();
        profile.preferred_approaches.clear();
        let mut therapist = create_test_therapist();
        therapist.therapeutic_approaches_used_list = vec!["DBT".into(), "Play Therapy".into()];

        // CBT and DBT are credited; "Play Therapy" matches nothing. Three listed approaches add 6
        assert_eq!(calculate_approach_score(&profile, &therapist), 46.0);
    }

    #[test]
    fn test_approach_diversity_bonus() {
        let mut profile = create_test_profile();
        profile.preferred_approaches = vec!["CBT".into(), "Psychodynamic".into()];
        let mut therapist = create_test_therapist();
        therapist.therapeutic_approaches_used_list =
            vec!["DBT".into(), "ACT".into(), "Narrative Therapy".into()];

        // Half the preferences matched plus 4 approaches at 2 points each
        assert_eq!(calculate_approach_score(&profile, &therapist), 58.0);

        therapist.therapeutic_approaches_used_list = (0..15).map(|i| format!("Approach {}", i)).collect();
        // Bonus tops out at 20
        assert_eq!(calculate_approach_score(&profile, &therapist), 70.0);
    }
}
