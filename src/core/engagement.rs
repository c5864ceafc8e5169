use crate::core::scoring::to_score;
use crate::models::{
    ClientEngagementAnalysis, EngagementLevel, EngagementMatch, TherapistPerformanceAnalysis,
    NEUTRAL_SCORE,
};

/// Score how well a therapist's track record fits the client's engagement pattern
///
/// overall = round(0.4 * engagement_compatibility + 0.4 * retention_match + 0.2 * session_time_match)
///
/// Returns the neutral sentinel when either snapshot is missing.
pub fn score_engagement(
    client: Option<&ClientEngagementAnalysis>,
    therapist: Option<&TherapistPerformanceAnalysis>,
) -> EngagementMatch {
    let (Some(client), Some(therapist)) = (client, therapist) else {
        return EngagementMatch::neutral();
    };

    let engagement_compatibility = engagement_compatibility(client, therapist);
    let retention_match = retention_match(client, therapist);
    let session_time_match = session_time_match(client);

    let overall = 0.4 * engagement_compatibility as f64
        + 0.4 * retention_match as f64
        + 0.2 * session_time_match as f64;

    EngagementMatch {
        engagement_compatibility,
        retention_match,
        session_time_match,
        overall_score: to_score(overall),
    }
}

fn engagement_compatibility(
    client: &ClientEngagementAnalysis,
    therapist: &TherapistPerformanceAnalysis,
) -> u8 {
    let mut score = NEUTRAL_SCORE as f64;

    match client.engagement_level {
        // Engaged clients want quick replies
        EngagementLevel::High => match therapist.average_response_time {
            Some(minutes) if minutes < 60.0 => score += 30.0,
            Some(minutes) if minutes < 240.0 => score += 15.0,
            _ => {}
        },
        // Disengaged clients need someone who keeps clients around
        EngagementLevel::Low => {
            if therapist.client_retention_rate > 0.7 {
                score += 30.0;
            } else if therapist.client_retention_rate > 0.5 {
                score += 15.0;
            }
        }
        EngagementLevel::Medium => score += 10.0,
    }

    if client.platform_usage_score > 0.7 && therapist.availability_utilization > 0.6 {
        score += 10.0;
    }

    to_score(score)
}

fn retention_match(client: &ClientEngagementAnalysis, therapist: &TherapistPerformanceAnalysis) -> u8 {
    let mut score = NEUTRAL_SCORE as f64;

    if client.meeting_attendance_rate < 0.7 {
        if therapist.client_retention_rate > 0.7 {
            score += 40.0;
        } else if therapist.client_retention_rate > 0.5 {
            score += 20.0;
        } else {
            score -= 20.0;
        }
    } else {
        score += 20.0;
    }

    if therapist.no_show_rate + therapist.cancellation_rate > 0.3 {
        score -= 15.0;
    }

    to_score(score)
}

/// Therapist schedules are not known here, so a stated preference earns a flat 60
#[inline]
fn session_time_match(client: &ClientEngagementAnalysis) -> u8 {
    if client.preferred_session_times.is_empty() {
        NEUTRAL_SCORE
    } else {
        60
    }
}
