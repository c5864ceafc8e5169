use crate::core::filters::{fuzzy_contains, fuzzy_match, fuzzy_overlap};
use crate::core::scoring::to_score;
use crate::models::{
    BaseScore, ConversationAnalysisResult, ConversationExplanation, ConversationFactors,
    EnhancedScore, MatchingWeights, ScoreBreakdown, TherapistProfile,
};
use thiserror::Error;

/// Share of the conversation total folded into the enhanced score
const CONVERSATION_WEIGHT: f64 = 0.15;
const MAX_CONVERSATION_TOTAL: u8 = 60;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("invalid scoring input: {0}")]
    InvalidInput(String),
}

/// Blend conversation signals into a base score
///
/// Without a conversation analysis the result carries zero factors and the
/// base breakdown untouched, so `total_score` equals the base total.
///
/// Enhanced total:
/// enhanced = round(
///     enhanced_condition * w.condition_match +
///     enhanced_approach * w.approach_compatibility +
///     experience * w.experience_and_success +
///     review * w.reviews_and_ratings +
///     enhanced_logistics * w.availability_and_logistics +
///     factors.total * 0.15
/// )
///
/// `total_score` is max(base total, enhanced total).
pub fn enhance(
    base: &BaseScore,
    analysis: Option<&ConversationAnalysisResult>,
    therapist: &TherapistProfile,
    weights: &MatchingWeights,
) -> Result<EnhancedScore, ScoringError> {
    let Some(analysis) = analysis else {
        return Ok(EnhancedScore {
            total_score: base.total_score,
            enhanced_total: base.total_score,
            breakdown: base.breakdown,
            factors: ConversationFactors::default(),
            explanation: ConversationExplanation::default(),
        });
    };

    if let Some(budget) = analysis.logistics_preferences.budget {
        if !budget.is_finite() || budget < 0.0 {
            return Err(ScoringError::InvalidInput(format!(
                "conversation budget must be a non-negative number, got {}",
                budget
            )));
        }
    }

    let factors = calculate_factors(analysis, therapist);
    let breakdown = enhance_breakdown(&base.breakdown, &factors, analysis, therapist);

    let enhanced = breakdown.condition_score as f64 * weights.condition_match
        + breakdown.approach_score as f64 * weights.approach_compatibility
        + breakdown.experience_score as f64 * weights.experience_and_success
        + breakdown.review_score as f64 * weights.reviews_and_ratings
        + breakdown.logistics_score as f64 * weights.availability_and_logistics
        + factors.total as f64 * CONVERSATION_WEIGHT;
    let enhanced_total = to_score(enhanced);

    Ok(EnhancedScore {
        total_score: base.total_score.max(enhanced_total),
        enhanced_total,
        breakdown,
        factors,
        explanation: ConversationExplanation {
            condition_matches: fuzzy_overlap(&analysis.mentioned_conditions, therapist.conditions()),
            preference_matches: fuzzy_overlap(
                &analysis.therapy_preferences.approaches,
                therapist.all_approaches(),
            ),
        },
    })
}

pub fn calculate_factors(
    analysis: &ConversationAnalysisResult,
    therapist: &TherapistProfile,
) -> ConversationFactors {
    let sentiment_alignment = sentiment_alignment(analysis, therapist);
    let mentioned_conditions_match = mentioned_conditions_match(analysis, therapist);
    let preference_alignment = preference_alignment(analysis, therapist);
    let communication_style_match = communication_style_match(therapist);

    let total = (sentiment_alignment
        + mentioned_conditions_match
        + preference_alignment
        + communication_style_match)
        .min(MAX_CONVERSATION_TOTAL);

    ConversationFactors {
        sentiment_alignment,
        mentioned_conditions_match,
        preference_alignment,
        communication_style_match,
        total,
    }
}

/// Urgent conversations favour experienced therapists; calm ones score a flat 10
#[inline]
fn sentiment_alignment(analysis: &ConversationAnalysisResult, therapist: &TherapistProfile) -> u8 {
    if !analysis.urgency_indicators.level.is_urgent() {
        return 10;
    }

    match therapist.years_of_experience {
        years if years >= 10 => 15,
        years if years >= 5 => 10,
        _ => 5,
    }
}

fn mentioned_conditions_match(analysis: &ConversationAnalysisResult, therapist: &TherapistProfile) -> u8 {
    let mentioned = &analysis.mentioned_conditions;
    if mentioned.is_empty() {
        return 0;
    }

    let matched = fuzzy_overlap(mentioned, therapist.conditions()).len();
    (20.0 * matched as f64 / mentioned.len() as f64).round() as u8
}

fn preference_alignment(analysis: &ConversationAnalysisResult, therapist: &TherapistProfile) -> u8 {
    let preferences = &analysis.therapy_preferences;

    let matched = fuzzy_overlap(&preferences.approaches, therapist.all_approaches()).len();
    let approach_part = 8.0 * matched as f64 / preferences.approaches.len().max(1) as f64;

    let format_matches = preferences
        .format
        .iter()
        .any(|format| fuzzy_contains(&therapist.accept_types, format));
    let format_part = if format_matches { 7.0 } else { 0.0 };

    ((approach_part + format_part).round() as u8).min(15)
}

/// Experience and breadth of approaches as a proxy for adaptable communication
#[inline]
fn communication_style_match(therapist: &TherapistProfile) -> u8 {
    let years = therapist.years_of_experience;
    let approaches = therapist.approach_count();

    if years >= 7 && approaches >= 3 {
        10
    } else if years >= 5 && approaches >= 2 {
        7
    } else {
        5
    }
}

fn enhance_breakdown(
    base: &ScoreBreakdown,
    factors: &ConversationFactors,
    analysis: &ConversationAnalysisResult,
    therapist: &TherapistProfile,
) -> ScoreBreakdown {
    let condition_bonus = (factors.mentioned_conditions_match as f64 * 1.5).round();

    ScoreBreakdown {
        condition_score: to_score(base.condition_score as f64 + condition_bonus),
        approach_score: to_score(base.approach_score as f64 + factors.preference_alignment as f64),
        experience_score: base.experience_score,
        review_score: base.review_score,
        logistics_score: enhance_logistics(base.logistics_score, analysis, therapist),
    }
}

fn enhance_logistics(
    base: u8,
    analysis: &ConversationAnalysisResult,
    therapist: &TherapistProfile,
) -> u8 {
    let logistics = &analysis.logistics_preferences;
    let mut score = base as f64;

    // A zero budget means none was given
    if let Some(budget) = logistics.budget.filter(|b| *b > 0.0) {
        let rate = therapist.hourly_rate_f64();
        if rate <= budget {
            score += 10.0;
        } else if rate > budget * 1.2 {
            score -= 15.0;
        }
    }

    if let (Some(location), Some(province)) = (&logistics.location, &therapist.province) {
        if fuzzy_match(location, province) {
            score += 10.0;
        }
    }

    let languages = &analysis.cultural_needs.languages;
    if !languages.is_empty() {
        let overlap = languages
            .iter()
            .any(|lang| fuzzy_contains(&therapist.languages_offered, lang));
        score += if overlap { 10.0 } else { -10.0 };
    }

    to_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ConversationLogistics, CulturalNeeds, MatchExplanation, TherapyPreferences,
        UrgencyIndicators, UrgencyLevel,
    };
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn base_score() -> BaseScore {
        BaseScore {
            total_score: 60,
            breakdown: ScoreBreakdown {
                condition_score: 50,
                approach_score: 50,
                experience_score: 70,
                review_score: 50,
                logistics_score: 75,
            },
            explanation: MatchExplanation::default(),
        }
    }

    fn therapist(years: u32) -> TherapistProfile {
        TherapistProfile {
            id: "t1".to_string(),
            expertise: vec!["Anxiety".into(), "Depression".into()],
            illness_specializations: vec![],
            approaches: vec!["CBT".into(), "DBT".into(), "ACT".into()],
            therapeutic_approaches_used_list: vec![],
            accept_types: vec!["online".into()],
            languages_offered: vec!["English".into()],
            province: Some("Ontario".into()),
            hourly_rate: Decimal::from(100),
            years_of_experience: years,
            accepts_insurance: false,
            accepted_insurance_types: vec![],
            treatment_success_rates: BTreeMap::new(),
            reviews: vec![],
        }
    }

    fn analysis(level: UrgencyLevel, mentioned: &[&str]) -> ConversationAnalysisResult {
        ConversationAnalysisResult {
            urgency_indicators: UrgencyIndicators {
                level,
                indicators: vec![],
            },
            mentioned_conditions: mentioned.iter().map(|m| m.to_string()).collect(),
            therapy_preferences: TherapyPreferences {
                approaches: vec!["CBT".into()],
                format: vec!["online".into()],
            },
            logistics_preferences: ConversationLogistics {
                budget: Some(120.0),
                location: Some("ontario".into()),
            },
            cultural_needs: CulturalNeeds {
                languages: vec!["english".into()],
            },
        }
    }

    #[test]
    fn test_absent_conversation_keeps_base() {
        let base = base_score();
        let enhanced = enhance(&base, None, &therapist(8), &MatchingWeights::default()).unwrap();

        assert_eq!(enhanced.factors, ConversationFactors::default());
        assert_eq!(enhanced.breakdown, base.breakdown);
        assert_eq!(enhanced.total_score, base.total_score);
    }

    #[test]
    fn test_sentiment_rule() {
        let calm = analysis(UrgencyLevel::Low, &[]);
        let urgent = analysis(UrgencyLevel::Critical, &[]);

        assert_eq!(sentiment_alignment(&calm, &therapist(1)), 10);
        assert_eq!(sentiment_alignment(&urgent, &therapist(12)), 15);
        assert_eq!(sentiment_alignment(&urgent, &therapist(6)), 10);
        assert_eq!(sentiment_alignment(&urgent, &therapist(2)), 5);
    }

    #[test]
    fn test_factors() {
        let analysis = analysis(UrgencyLevel::High, &["anxiety", "insomnia"]);
        let factors = calculate_factors(&analysis, &therapist(10));

        assert_eq!(factors.sentiment_alignment, 15);
        assert_eq!(factors.mentioned_conditions_match, 10);
        assert_eq!(factors.preference_alignment, 15);
        assert_eq!(factors.communication_style_match, 10);
        assert_eq!(factors.total, 50);
    }

    #[test]
    fn test_enhanced_breakdown() {
        let base = base_score();
        let analysis = analysis(UrgencyLevel::Low, &["anxiety", "depression"]);
        let enhanced =
            enhance(&base, Some(&analysis), &therapist(8), &MatchingWeights::default()).unwrap();

        // 20 mentioned-condition points earn a 30 point bonus
        assert_eq!(enhanced.breakdown.condition_score, 80);
        assert_eq!(enhanced.breakdown.approach_score, 65);
        // budget, location and language all fit
        assert_eq!(enhanced.breakdown.logistics_score, 100);
        assert_eq!(enhanced.breakdown.experience_score, 70);
        assert!(enhanced.total_score >= base.total_score);
        assert_eq!(enhanced.explanation.condition_matches, vec!["anxiety", "depression"]);
    }

    #[test]
    fn test_never_below_base() {
        let mut base = base_score();
        base.total_score = 100;
        let analysis = analysis(UrgencyLevel::Low, &[]);

        let enhanced =
            enhance(&base, Some(&analysis), &therapist(1), &MatchingWeights::default()).unwrap();

        assert_eq!(enhanced.total_score, 100);
    }

    #[test]
    fn test_invalid_budget() {
        let mut analysis = analysis(UrgencyLevel::Low, &[]);
        analysis.logistics_preferences.budget = Some(f64::NAN);

        let result = enhance(&base_score(), Some(&analysis), &therapist(3), &MatchingWeights::default());

        assert!(matches!(result, Err(ScoringError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_budget_is_ignored() {
        let mut analysis = analysis(UrgencyLevel::Low, &[]);
        analysis.logistics_preferences.budget = Some(0.0);
        analysis.logistics_preferences.location = None;
        analysis.cultural_needs.languages.clear();

        let enhanced =
            enhance(&base_score(), Some(&analysis), &therapist(3), &MatchingWeights::default()).unwrap();

        assert_eq!(enhanced.breakdown.logistics_score, 75);
    }
}
