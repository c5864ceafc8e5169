use crate::core::scoring::to_score;
use crate::core::severity::PRIMARY_WEIGHT;
use crate::models::{
    ClientConditionProfile, PerformanceMatch, ReviewSentimentAnalysis, Sentiment,
    TherapistPerformanceAnalysis, NEUTRAL_SCORE,
};

/// Score a therapist's historical performance against the client's conditions
///
/// overall = round(
///     0.35 * success_rate_match +
///     0.25 * workload_match +
///     0.20 * availability_match +
///     0.20 * communication_style_match
/// )
pub fn score_performance(
    performance: Option<&TherapistPerformanceAnalysis>,
    profile: &ClientConditionProfile,
    sentiment: Option<&ReviewSentimentAnalysis>,
) -> PerformanceMatch {
    let Some(performance) = performance else {
        return PerformanceMatch::neutral();
    };

    let success_rate_match = success_rate_match(performance, profile);
    let workload_match = to_score(100.0 * (1.0 - performance.workload_capacity));
    let availability_match = availability_match(performance.availability_utilization);
    let communication_style_match = communication_style_match(performance, profile, sentiment);

    let overall = 0.35 * success_rate_match as f64
        + 0.25 * workload_match as f64
        + 0.2 * availability_match as f64
        + 0.2 * communication_style_match as f64;

    PerformanceMatch {
        success_rate_match,
        workload_match,
        availability_match,
        communication_style_match,
        overall_score: to_score(overall),
    }
}

fn success_rate_match(performance: &TherapistPerformanceAnalysis, profile: &ClientConditionProfile) -> u8 {
    let rates: Vec<f64> = profile
        .all_conditions()
        .filter_map(|entry| performance.success_rates_by_condition.get(&entry.condition))
        .copied()
        .collect();

    if rates.is_empty() {
        return NEUTRAL_SCORE;
    }

    let average = rates.iter().sum::<f64>() / rates.len() as f64;
    to_score(100.0 * average)
}

/// Moderately booked therapists are preferred over idle or saturated ones
#[inline]
fn availability_match(utilization: f64) -> u8 {
    if utilization < 0.4 {
        60
    } else if utilization <= 0.7 {
        90
    } else {
        40
    }
}

fn communication_style_match(
    performance: &TherapistPerformanceAnalysis,
    profile: &ClientConditionProfile,
    sentiment: Option<&ReviewSentimentAnalysis>,
) -> u8 {
    let style = &performance.communication_style;
    let mut score = NEUTRAL_SCORE as f64;

    let high_severity = profile
        .primary_conditions
        .iter()
        .any(|entry| entry.weight >= PRIMARY_WEIGHT);

    if high_severity {
        if style.warmth > 0.7 {
            score += 20.0;
        }
        if style.flexibility > 0.7 {
            score += 15.0;
        }
    } else if style.structure > 0.6 {
        score += 15.0;
    }

    match sentiment.map(|s| s.overall_sentiment) {
        Some(Sentiment::Positive) => score += 10.0,
        Some(Sentiment::Negative) => score -= 15.0,
        Some(Sentiment::Neutral) | None => {}
    }

    to_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClientPreferences, CommunicationStyle, PreAssessment,
    };
    use std::collections::BTreeMap;

    fn profile(severity: &str) -> ClientConditionProfile {
        let assessment = PreAssessment {
            questionnaires: vec!["Depression".into()],
            severity_levels: BTreeMap::from([("Depression".to_string(), severity.to_string())]),
        };
        ClientConditionProfile::from_assessment(&assessment, &ClientPreferences::default())
    }

    fn performance() -> TherapistPerformanceAnalysis {
        TherapistPerformanceAnalysis {
            average_response_time: Some(90.0),
            client_retention_rate: 0.8,
            no_show_rate: 0.1,
            cancellation_rate: 0.1,
            workload_capacity: 0.2,
            availability_utilization: 0.5,
            success_rates_by_condition: BTreeMap::from([("Depression".to_string(), 0.75)]),
            communication_style: CommunicationStyle {
                warmth: 0.8,
                directness: 0.5,
                structure: 0.7,
                flexibility: 0.8,
            },
        }
    }

    #[test]
    fn test_missing_performance_is_neutral() {
        assert_eq!(
            score_performance(None, &profile("Severe"), None),
            PerformanceMatch::neutral()
        );
    }

    #[test]
    fn test_workload_match() {
        let result = score_performance(Some(&performance()), &profile("Severe"), None);
        assert_eq!(result.workload_match, 80);
    }

    #[test]
    fn test_success_rate_match() {
        let result = score_performance(Some(&performance()), &profile("Severe"), None);
        assert_eq!(result.success_rate_match, 75);

        let unknown = score_performance(Some(&performance()), &profile("Mild"), None);
        // Mild depression is still a secondary condition with data
        assert_eq!(unknown.success_rate_match, 75);

        let mut empty = performance();
        empty.success_rates_by_condition.clear();
        let neutral = score_performance(Some(&empty), &profile("Severe"), None);
        assert_eq!(neutral.success_rate_match, 50);
    }

    #[test]
    fn test_availability_bands() {
        assert_eq!(availability_match(0.2), 60);
        assert_eq!(availability_match(0.4), 90);
        assert_eq!(availability_match(0.7), 90);
        assert_eq!(availability_match(0.9), 40);
    }

    #[test]
    fn test_communication_style() {
        let positive = ReviewSentimentAnalysis {
            overall_sentiment: Sentiment::Positive,
        };
        let negative = ReviewSentimentAnalysis {
            overall_sentiment: Sentiment::Negative,
        };

        let severe = score_performance(Some(&performance()), &profile("Severe"), Some(&positive));
        assert_eq!(severe.communication_style_match, 95);

        let mild = score_performance(Some(&performance()), &profile("Mild"), Some(&negative));
        assert_eq!(mild.communication_style_match, 50);
    }
}
