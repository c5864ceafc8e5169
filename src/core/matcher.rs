use crate::core::{
    conversation::enhance,
    engagement::score_engagement,
    performance::score_performance,
    preference::StatedPreferenceScorer,
    scoring::{score_base, to_score},
    weights::{resolve_weights, WeightHints},
};
use crate::models::{
    BatchOutcome, CandidateError, ClientConditionProfile, ClientEngagementAnalysis,
    ConversationAnalysisResult, MatchResult, MatchingWeights, TherapistProfile,
};
use crate::services::{PreferenceMatcher, SnapshotSource, SourceError};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

/// Errors that abort a single match
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("client {client_id} has no pre-assessment")]
    MissingPreAssessment { client_id: String },

    #[error("therapist {therapist_id} is invalid: {reason}")]
    InvalidCandidate { therapist_id: String, reason: String },

    #[error("invalid matching weights: {0}")]
    InvalidWeights(String),

    #[error("client not found: {0}")]
    ClientNotFound(String),

    #[error("snapshot source error: {0}")]
    Source(#[from] SourceError),
}

/// Per-client inputs shared by every candidate in a run
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingContext {
    pub client_id: String,
    /// `None` when the client never completed a pre-assessment
    pub profile: Option<ClientConditionProfile>,
    pub conversation: Option<ConversationAnalysisResult>,
    pub engagement: Option<ClientEngagementAnalysis>,
    /// The engagement call failed or timed out, so the engagement factor is dropped
    pub engagement_failed: bool,
    pub weights: MatchingWeights,
}

/// Runtime knobs for the matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherSettings {
    /// Upper bound on each collaborator call
    pub call_timeout: Duration,
    /// Candidates scored at once by a batch
    pub max_concurrency: usize,
    /// Results kept by `rank` when no limit is given
    pub default_limit: usize,
    /// Replaces the resolved weight preset when set
    pub weights: Option<MatchingWeights>,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_millis(2000),
            max_concurrency: 8,
            default_limit: 10,
            weights: None,
        }
    }
}

/// Outcome of one guarded collaborator call
enum Signal<T> {
    Ready(Option<T>),
    Failed,
}

impl<T> Signal<T> {
    fn into_option(self) -> Option<T> {
        match self {
            Signal::Ready(value) => value,
            Signal::Failed => None,
        }
    }
}

/// Main matching orchestrator
///
/// # Pipeline
/// 1. Build a per-client context once (profile, conversation, engagement, weights)
/// 2. Per candidate: base score, conversation enhancement, then the
///    engagement, performance and preference signals fetched concurrently
/// 3. Recombine into one comprehensive score and rank
///
/// Every collaborator call is bounded by `call_timeout`. A failed or slow
/// call removes that signal from the result instead of failing the match.
#[derive(Clone)]
pub struct Matcher {
    source: Arc<dyn SnapshotSource>,
    preference: Arc<dyn PreferenceMatcher>,
    settings: MatcherSettings,
}

impl Matcher {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        preference: Arc<dyn PreferenceMatcher>,
        settings: MatcherSettings,
    ) -> Self {
        Self {
            source,
            preference,
            settings,
        }
    }

    /// Matcher whose preference signal comes from the client's stated preferences
    pub fn with_stated_preferences(source: Arc<dyn SnapshotSource>, settings: MatcherSettings) -> Self {
        let preference = Arc::new(StatedPreferenceScorer::new(source.clone()));
        Self::new(source, preference, settings)
    }

    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    /// Load everything about the client that does not depend on the candidate
    ///
    /// Explicit weights win over the resolved preset and must be non-negative.
    /// Conversation and engagement degrade to absent on failure; a failing
    /// profile load is an error.
    pub async fn build_context(
        &self,
        client_id: &str,
        weights: Option<MatchingWeights>,
    ) -> Result<MatchingContext, MatchError> {
        if let Some(weights) = &weights {
            weights
                .validate()
                .map_err(|e| MatchError::InvalidWeights(e.to_string()))?;
        }

        let (profile, conversation, engagement) = tokio::join!(
            tokio::time::timeout(
                self.settings.call_timeout,
                self.source.load_client_profile(client_id)
            ),
            self.settle(
                "conversation",
                client_id,
                self.source.analyze_conversation(client_id)
            ),
            self.settle(
                "engagement",
                client_id,
                self.source.analyze_client_engagement(client_id)
            ),
        );

        let profile = match profile {
            Ok(Ok(profile)) => profile,
            Ok(Err(SourceError::NotFound(_))) => {
                return Err(MatchError::ClientNotFound(client_id.to_string()))
            }
            Ok(Err(e)) => return Err(MatchError::Source(e)),
            Err(_) => {
                return Err(MatchError::Source(SourceError::Unavailable(format!(
                    "client profile load timed out after {:?}",
                    self.settings.call_timeout
                ))))
            }
        };

        // Only a confirmed absence of engagement data marks a new client
        let is_new_client = matches!(engagement, Signal::Ready(None));
        let engagement_failed = matches!(engagement, Signal::Failed);
        let conversation = conversation.into_option();
        let engagement = engagement.into_option();

        let weights = weights.unwrap_or_else(|| {
            resolve_weights(WeightHints {
                urgency: conversation.as_ref().map(|c| c.urgency_indicators.level),
                engagement: engagement.as_ref().map(|e| e.engagement_level),
                is_new_client,
            })
        });

        tracing::info!(
            client_id,
            has_profile = profile.is_some(),
            has_conversation = conversation.is_some(),
            has_engagement = engagement.is_some(),
            "Matching context built"
        );

        Ok(MatchingContext {
            client_id: client_id.to_string(),
            profile,
            conversation,
            engagement,
            engagement_failed,
            weights,
        })
    }

    /// Score one candidate
    ///
    /// Comprehensive score:
    /// comprehensive = round(clamp(
    ///     base +
    ///     engagement.overall * w.engagement_compatibility +
    ///     performance.overall * w.performance_match +
    ///     preference.overall * w.preference_match,
    ///     0, 100))
    ///
    /// where `base` is max(base total, conversation-enhanced total) and a
    /// signal that failed contributes 0.
    pub async fn match_candidate(
        &self,
        ctx: &MatchingContext,
        therapist: &TherapistProfile,
    ) -> Result<MatchResult, MatchError> {
        therapist
            .validate()
            .map_err(|e| MatchError::InvalidCandidate {
                therapist_id: therapist.id.clone(),
                reason: e.to_string(),
            })?;

        let base = score_base(ctx.profile.as_ref(), therapist, &ctx.weights).map_err(|_| {
            MatchError::MissingPreAssessment {
                client_id: ctx.client_id.clone(),
            }
        })?;

        let (base_score, breakdown, conversation_factors, conversation_explanation) =
            match enhance(&base, ctx.conversation.as_ref(), therapist, &ctx.weights) {
                Ok(enhanced) => (
                    enhanced.total_score,
                    enhanced.breakdown,
                    Some(enhanced.factors),
                    Some(enhanced.explanation),
                ),
                Err(e) => {
                    tracing::warn!(
                        client_id = %ctx.client_id,
                        therapist_id = %therapist.id,
                        error = %e,
                        "Conversation scoring failed, using base score"
                    );
                    (base.total_score, base.breakdown, None, None)
                }
            };

        let (performance, sentiment, preference) = tokio::join!(
            self.settle(
                "performance",
                &therapist.id,
                self.source.analyze_therapist_performance(&therapist.id)
            ),
            self.settle(
                "review_sentiment",
                &therapist.id,
                self.source.analyze_review_sentiment(&therapist.id)
            ),
            self.settle(
                "preference",
                &therapist.id,
                self.preference.match_preference(&ctx.client_id, therapist)
            ),
        );

        // Both behavioural scorers read the performance snapshot; a failed
        // engagement call drops only the engagement factor
        let (engagement_match, performance_match) = match performance {
            Signal::Ready(performance) => {
                let profile = ctx.profile.as_ref().ok_or_else(|| MatchError::MissingPreAssessment {
                    client_id: ctx.client_id.clone(),
                })?;
                let engagement_match = (!ctx.engagement_failed)
                    .then(|| score_engagement(ctx.engagement.as_ref(), performance.as_ref()));
                (
                    engagement_match,
                    Some(score_performance(
                        performance.as_ref(),
                        profile,
                        sentiment.into_option().as_ref(),
                    )),
                )
            }
            Signal::Failed => (None, None),
        };
        let preference_match = preference.into_option();

        let weights = &ctx.weights;
        let comprehensive = base_score as f64
            + engagement_match.map_or(0.0, |m| m.overall_score as f64)
                * weights.engagement_compatibility
            + performance_match.map_or(0.0, |m| m.overall_score as f64) * weights.performance_match
            + preference_match.map_or(0.0, |m| m.overall_score as f64) * weights.preference_match;
        let comprehensive_score = to_score(comprehensive);

        tracing::debug!(
            client_id = %ctx.client_id,
            therapist_id = %therapist.id,
            base_score,
            comprehensive_score,
            "Candidate scored"
        );

        Ok(MatchResult {
            therapist_id: therapist.id.clone(),
            total_score: comprehensive_score,
            base_score,
            breakdown,
            explanation: base.explanation,
            conversation_factors,
            conversation_explanation,
            engagement_match,
            performance_match,
            preference_match,
            comprehensive_score,
        })
    }

    /// Score many candidates with bounded concurrency
    ///
    /// A failing candidate is reported in `errors` and never affects the
    /// others. Results are sorted by comprehensive score (descending), then
    /// therapist id.
    pub async fn match_batch(&self, ctx: &MatchingContext, therapists: Vec<TherapistProfile>) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "match_batch",
            %run_id,
            client_id = %ctx.client_id,
            candidates = therapists.len()
        );

        let outcomes = stream::iter(therapists)
            .map(|therapist| async move {
                let result = self.match_candidate(ctx, &therapist).await;
                (therapist.id, result)
            })
            .buffered(self.settings.max_concurrency.max(1))
            .collect::<Vec<_>>()
            .instrument(span.clone())
            .await;

        span.in_scope(|| finish_batch(outcomes))
    }

    /// Like [`Matcher::match_batch`], loading each therapist by id first
    ///
    /// Unknown ids become candidate errors.
    pub async fn match_batch_ids(&self, ctx: &MatchingContext, therapist_ids: &[String]) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "match_batch",
            %run_id,
            client_id = %ctx.client_id,
            candidates = therapist_ids.len()
        );

        let outcomes = stream::iter(therapist_ids)
            .map(|therapist_id| async move {
                let result = match self.load_therapist(therapist_id).await {
                    Ok(therapist) => self.match_candidate(ctx, &therapist).await,
                    Err(e) => Err(e),
                };
                (therapist_id.clone(), result)
            })
            .buffered(self.settings.max_concurrency.max(1))
            .collect::<Vec<_>>()
            .instrument(span.clone())
            .await;

        span.in_scope(|| finish_batch(outcomes))
    }

    /// Build the context for `client_id`, score every therapist and keep the best
    pub async fn rank(
        &self,
        client_id: &str,
        therapists: Vec<TherapistProfile>,
        limit: Option<usize>,
    ) -> Result<BatchOutcome, MatchError> {
        let ctx = self.build_context(client_id, self.settings.weights).await?;
        let mut outcome = self.match_batch(&ctx, therapists).await;
        outcome
            .results
            .truncate(limit.unwrap_or(self.settings.default_limit));
        Ok(outcome)
    }

    async fn load_therapist(&self, therapist_id: &str) -> Result<TherapistProfile, MatchError> {
        match tokio::time::timeout(
            self.settings.call_timeout,
            self.source.load_therapist_profile(therapist_id),
        )
        .await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(MatchError::Source(SourceError::Unavailable(format!(
                "therapist {} load timed out",
                therapist_id
            )))),
        }
    }

    /// Run a collaborator call under the timeout, logging and absorbing failures
    async fn settle<T, F>(&self, signal: &'static str, id: &str, call: F) -> Signal<T>
    where
        F: Future<Output = Result<Option<T>, SourceError>>,
    {
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(Ok(value)) => Signal::Ready(value),
            Ok(Err(e)) => {
                tracing::warn!(signal, id, error = %e, "Signal unavailable");
                Signal::Failed
            }
            Err(_) => {
                tracing::warn!(
                    signal,
                    id,
                    timeout_ms = self.settings.call_timeout.as_millis() as u64,
                    "Signal timed out"
                );
                Signal::Failed
            }
        }
    }
}

fn finish_batch(outcomes: Vec<(String, Result<MatchResult, MatchError>)>) -> BatchOutcome {
    let total = outcomes.len();
    let mut results = Vec::with_capacity(total);
    let mut errors = Vec::new();

    for (candidate_id, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => errors.push(CandidateError {
                candidate_id,
                error: e.to_string(),
            }),
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            failed = errors.len(),
            total,
            "Some candidates could not be scored"
        );
    }

    // Sort by score (descending) and then by id (ascending)
    results.sort_by(|a: &MatchResult, b: &MatchResult| {
        b.comprehensive_score
            .cmp(&a.comprehensive_score)
            .then_with(|| a.therapist_id.cmp(&b.therapist_id))
    });

    tracing::info!(matched = results.len(), failed = errors.len(), "Batch complete");

    BatchOutcome { results, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientPreferences, PreAssessment};
    use crate::services::{ClientRecord, InMemorySource, TherapistRecord};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn client(id: &str) -> ClientRecord {
        ClientRecord {
            id: id.to_string(),
            pre_assessment: Some(PreAssessment {
                questionnaires: vec!["Anxiety".into()],
                severity_levels: BTreeMap::from([("Anxiety".to_string(), "Severe".to_string())]),
            }),
            preferences: Some(ClientPreferences {
                approaches: vec!["CBT".into()],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn therapist(id: &str, expertise: &str) -> TherapistProfile {
        TherapistProfile {
            id: id.to_string(),
            expertise: vec![expertise.to_string()],
            illness_specializations: vec![],
            approaches: vec!["CBT".into()],
            therapeutic_approaches_used_list: vec![],
            accept_types: vec!["online".into()],
            languages_offered: vec!["English".into()],
            province: None,
            hourly_rate: Decimal::from(100),
            years_of_experience: 6,
            accepts_insurance: false,
            accepted_insurance_types: vec![],
            treatment_success_rates: BTreeMap::new(),
            reviews: vec![],
        }
    }

    fn matcher(source: InMemorySource) -> Matcher {
        Matcher::with_stated_preferences(Arc::new(source), MatcherSettings::default())
    }

    #[tokio::test]
    async fn test_new_client_gets_new_client_weights() {
        let matcher = matcher(InMemorySource::new().with_client(client("c1")));

        let ctx = matcher.build_context("c1", None).await.unwrap();

        assert_eq!(ctx.weights, crate::core::weights::NEW_CLIENT_WEIGHTS);
        assert!(ctx.profile.is_some());
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let matcher = matcher(InMemorySource::new());

        let result = matcher.build_context("ghost", None).await;

        assert_eq!(result, Err(MatchError::ClientNotFound("ghost".into())));
    }

    #[tokio::test]
    async fn test_negative_weights_rejected() {
        let matcher = matcher(InMemorySource::new().with_client(client("c1")));
        let weights = MatchingWeights {
            condition_match: -0.1,
            ..MatchingWeights::default()
        };

        let result = matcher.build_context("c1", Some(weights)).await;

        assert!(matches!(result, Err(MatchError::InvalidWeights(_))));
    }

    #[tokio::test]
    async fn test_better_fit_ranks_first() {
        let matcher = matcher(
            InMemorySource::new()
                .with_client(client("c1"))
                .with_therapist(TherapistRecord {
                    profile: therapist("t1", "Grief"),
                    performance: None,
                    review_sentiment: None,
                }),
        );
        let ctx = matcher.build_context("c1", None).await.unwrap();

        let outcome = matcher
            .match_batch(&ctx, vec![therapist("t1", "Grief"), therapist("t2", "Anxiety")])
            .await;

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.results[0].therapist_id, "t2");
        assert!(outcome.results[0].comprehensive_score > outcome.results[1].comprehensive_score);
    }

    #[tokio::test]
    async fn test_unknown_ids_become_candidate_errors() {
        let matcher = matcher(
            InMemorySource::new()
                .with_client(client("c1"))
                .with_therapist(TherapistRecord {
                    profile: therapist("t1", "Anxiety"),
                    performance: None,
                    review_sentiment: None,
                }),
        );
        let ctx = matcher.build_context("c1", None).await.unwrap();

        let outcome = matcher
            .match_batch_ids(&ctx, &["t1".to_string(), "missing".to_string()])
            .await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].candidate_id, "missing");
    }
}
