//! Pure derivations that turn raw platform activity into analysis snapshots.
//!
//! A snapshot source backed by a real store would count rows and call these;
//! the in-memory source uses `review_sentiment` for therapists without an
//! explicit sentiment snapshot.

use crate::models::{
    ClientEngagementAnalysis, CommunicationStyle, EngagementLevel, EngagementTrend,
    ReviewSentimentAnalysis, Sentiment,
};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Active clients at which a therapist counts as fully booked
const ESTIMATED_MAX_CAPACITY: f64 = 25.0;
/// Change in average engagement that counts as a trend
const TREND_THRESHOLD: f64 = 0.1;

const DIRECT_KEYWORDS: [&str; 5] = ["direct", "straightforward", "clear", "honest", "blunt"];
const WARMTH_KEYWORDS: [&str; 6] = ["warm", "caring", "empathetic", "compassionate", "supportive", "kind"];
const STRUCTURE_KEYWORDS: [&str; 5] = ["structured", "organized", "systematic", "methodical", "planned"];
const FLEXIBILITY_KEYWORDS: [&str; 5] = ["flexible", "adaptable", "open", "accommodating", "adjustable"];

/// Raw activity counts for one client over one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientActivity {
    pub journal_entries: u32,
    pub worksheets_assigned: u32,
    pub worksheets_completed: u32,
    /// Completed, cancelled and no-show meetings
    pub meetings_concluded: u32,
    pub meetings_attended: u32,
    pub reviews_written: u32,
}

impl ClientActivity {
    pub fn worksheet_completion_rate(&self) -> f64 {
        ratio(self.worksheets_completed, self.worksheets_assigned)
    }

    pub fn meeting_attendance_rate(&self) -> f64 {
        ratio(self.meetings_attended, self.meetings_concluded)
    }

    /// Mean of usage, attendance and worksheet completion
    fn average_engagement(&self) -> f64 {
        (platform_usage_score(self) + self.meeting_attendance_rate() + self.worksheet_completion_rate())
            / 3.0
    }
}

/// A review with its free text, used for communication style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewText {
    pub rating: u8,
    #[serde(default)]
    pub content: Option<String>,
}

#[inline]
fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Platform usage in [0, 1]
///
/// usage = min(1, 0.3 * min(journals / 10, 1) + 0.3 * worksheet_rate
///                + 0.3 * attendance + 0.1 * min(reviews / 5, 1))
pub fn platform_usage_score(activity: &ClientActivity) -> f64 {
    let journal = (activity.journal_entries as f64 / 10.0).min(1.0) * 0.3;
    let worksheets = activity.worksheet_completion_rate() * 0.3;
    let attendance = activity.meeting_attendance_rate() * 0.3;
    let reviews = (activity.reviews_written as f64 / 5.0).min(1.0) * 0.1;

    (journal + worksheets + attendance + reviews).min(1.0)
}

pub fn engagement_level(activity: &ClientActivity) -> EngagementLevel {
    let average = activity.average_engagement();
    if average >= 0.7 {
        EngagementLevel::High
    } else if average >= 0.4 {
        EngagementLevel::Medium
    } else {
        EngagementLevel::Low
    }
}

pub fn engagement_trend(previous: &ClientActivity, current: &ClientActivity) -> EngagementTrend {
    let change = current.average_engagement() - previous.average_engagement();
    if change > TREND_THRESHOLD {
        EngagementTrend::Increasing
    } else if change < -TREND_THRESHOLD {
        EngagementTrend::Decreasing
    } else {
        EngagementTrend::Stable
    }
}

/// The two most common slots among completed meeting start times
///
/// Weekend meetings count as "weekend" whatever the hour. Ties go to the
/// alphabetically first slot.
pub fn preferred_session_times(starts: &[NaiveDateTime]) -> Vec<String> {
    let mut slots: BTreeMap<&'static str, usize> = BTreeMap::new();

    for start in starts {
        let slot = match start.weekday() {
            Weekday::Sat | Weekday::Sun => "weekend",
            _ if start.hour() < 12 => "morning",
            _ if start.hour() < 17 => "afternoon",
            _ => "evening",
        };
        *slots.entry(slot).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = slots.into_iter().collect();
    // Stable sort keeps the BTreeMap's alphabetical order among ties
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(2).map(|(slot, _)| slot.to_string()).collect()
}

/// Build a client engagement snapshot from two periods of activity
pub fn client_engagement(
    current: &ClientActivity,
    previous: Option<&ClientActivity>,
    session_starts: &[NaiveDateTime],
) -> ClientEngagementAnalysis {
    ClientEngagementAnalysis {
        engagement_level: engagement_level(current),
        meeting_attendance_rate: current.meeting_attendance_rate(),
        platform_usage_score: platform_usage_score(current),
        preferred_session_times: preferred_session_times(session_starts),
        engagement_trend: previous
            .map(|previous| engagement_trend(previous, current))
            .unwrap_or_default(),
    }
}

/// Communication style from review keywords blended with the average rating
pub fn communication_style(reviews: &[ReviewText]) -> CommunicationStyle {
    if reviews.is_empty() {
        return CommunicationStyle::default();
    }

    let content = reviews
        .iter()
        .filter_map(|review| review.content.as_deref())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    let keyword_share = |keywords: &[&str]| -> f64 {
        let hits = keywords.iter().filter(|kw| content.contains(*kw)).count();
        hits as f64 / keywords.len() as f64
    };

    let average = reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64;
    let rating_factor = (average - 1.0) / 4.0;
    let blend = |share: f64| (share * 0.7 + rating_factor * 0.3).clamp(0.0, 1.0);

    CommunicationStyle {
        warmth: blend(keyword_share(&WARMTH_KEYWORDS)),
        directness: blend(keyword_share(&DIRECT_KEYWORDS)),
        structure: blend(keyword_share(&STRUCTURE_KEYWORDS)),
        flexibility: blend(keyword_share(&FLEXIBILITY_KEYWORDS)),
    }
}

/// Overall sentiment from approved ratings, `None` without any
pub fn review_sentiment<I>(ratings: I) -> Option<ReviewSentimentAnalysis>
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), rating| (sum + rating as u32, count + 1));

    if count == 0 {
        return None;
    }

    let average = sum as f64 / count as f64;
    let overall_sentiment = if average >= 4.0 {
        Sentiment::Positive
    } else if average < 2.5 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };

    Some(ReviewSentimentAnalysis { overall_sentiment })
}

#[inline]
pub fn workload_capacity(active_clients: u32) -> f64 {
    (active_clients as f64 / ESTIMATED_MAX_CAPACITY).min(1.0)
}
