use crate::models::{
    ClientConditionProfile, ClientEngagementAnalysis, ClientPreferences,
    ConversationAnalysisResult, PreAssessment, PreferenceMatch, ReviewSentimentAnalysis,
    TherapistPerformanceAnalysis, TherapistProfile,
};
use crate::services::analytics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by snapshot collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

/// Read-only access to the snapshots the matcher scores
///
/// The `analyze_*` calls return `Ok(None)` when there is simply no data;
/// errors are reserved for the source itself failing.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// `Ok(None)` when the client exists but never completed a pre-assessment
    async fn load_client_profile(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientConditionProfile>, SourceError>;

    async fn load_client_preferences(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientPreferences>, SourceError>;

    async fn load_therapist_profile(&self, therapist_id: &str) -> Result<TherapistProfile, SourceError>;

    async fn analyze_conversation(
        &self,
        client_id: &str,
    ) -> Result<Option<ConversationAnalysisResult>, SourceError>;

    async fn analyze_client_engagement(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientEngagementAnalysis>, SourceError>;

    async fn analyze_therapist_performance(
        &self,
        therapist_id: &str,
    ) -> Result<Option<TherapistPerformanceAnalysis>, SourceError>;

    async fn analyze_review_sentiment(
        &self,
        therapist_id: &str,
    ) -> Result<Option<ReviewSentimentAnalysis>, SourceError>;
}

/// Stated-preference scoring collaborator
#[async_trait]
pub trait PreferenceMatcher: Send + Sync {
    async fn match_preference(
        &self,
        client_id: &str,
        therapist: &TherapistProfile,
    ) -> Result<Option<PreferenceMatch>, SourceError>;
}

/// Names each collaborator call, for failure and latency injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCall {
    ClientProfile,
    ClientPreferences,
    TherapistProfile,
    Conversation,
    Engagement,
    Performance,
    ReviewSentiment,
}

/// Everything known about one client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: String,
    #[serde(default)]
    pub pre_assessment: Option<PreAssessment>,
    #[serde(default)]
    pub preferences: Option<ClientPreferences>,
    #[serde(default)]
    pub conversation: Option<ConversationAnalysisResult>,
    #[serde(default)]
    pub engagement: Option<ClientEngagementAnalysis>,
}

/// Everything known about one therapist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapistRecord {
    pub profile: TherapistProfile,
    #[serde(default)]
    pub performance: Option<TherapistPerformanceAnalysis>,
    /// Derived from approved review ratings when absent
    #[serde(default)]
    pub review_sentiment: Option<ReviewSentimentAnalysis>,
}

/// JSON fixture layout accepted by [`InMemorySource::from_fixture`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
    #[serde(default)]
    pub therapists: Vec<TherapistRecord>,
}

/// In-memory snapshot source
///
/// Used by tests and the fixture-driven binary. Individual calls can be made
/// to fail or to stall for a while, keyed by call kind and id.
#[derive(Debug, Default)]
pub struct InMemorySource {
    clients: HashMap<String, ClientRecord>,
    therapists: HashMap<String, TherapistRecord>,
    /// Therapist ids in insertion order
    therapist_order: Vec<String>,
    failures: HashMap<(SourceCall, String), SourceError>,
    delays: HashMap<(SourceCall, String), Duration>,
    calls: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON fixture from disk
    pub fn from_fixture(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let fixture: Fixture =
            serde_json::from_str(raw).map_err(|e| SourceError::Invalid(e.to_string()))?;

        let mut source = Self::new();
        for client in fixture.clients {
            source = source.with_client(client);
        }
        for therapist in fixture.therapists {
            source = source.with_therapist(therapist);
        }
        Ok(source)
    }

    pub fn with_client(mut self, client: ClientRecord) -> Self {
        self.clients.insert(client.id.clone(), client);
        self
    }

    pub fn with_therapist(mut self, therapist: TherapistRecord) -> Self {
        let id = therapist.profile.id.clone();
        if !self.therapists.contains_key(&id) {
            self.therapist_order.push(id.clone());
        }
        self.therapists.insert(id, therapist);
        self
    }

    /// Make `call` for `id` fail with `error`
    pub fn fail(mut self, call: SourceCall, id: &str, error: SourceError) -> Self {
        self.failures.insert((call, id.to_string()), error);
        self
    }

    /// Make `call` for `id` sleep before answering
    pub fn delay(mut self, call: SourceCall, id: &str, duration: Duration) -> Self {
        self.delays.insert((call, id.to_string()), duration);
        self
    }

    /// Client ids, sorted
    pub fn client_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.clients.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Therapist profiles in insertion order
    pub fn therapists(&self) -> Vec<TherapistProfile> {
        self.therapist_order
            .iter()
            .filter_map(|id| self.therapists.get(id))
            .map(|record| record.profile.clone())
            .collect()
    }

    /// Number of collaborator calls answered so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    async fn inject(&self, call: SourceCall, id: &str) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let key = (call, id.to_string());
        if let Some(duration) = self.delays.get(&key) {
            tokio::time::sleep(*duration).await;
        }
        match self.failures.get(&key) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn client(&self, client_id: &str) -> Result<&ClientRecord, SourceError> {
        self.clients
            .get(client_id)
            .ok_or_else(|| SourceError::NotFound(format!("client {}", client_id)))
    }

    fn therapist(&self, therapist_id: &str) -> Result<&TherapistRecord, SourceError> {
        self.therapists
            .get(therapist_id)
            .ok_or_else(|| SourceError::NotFound(format!("therapist {}", therapist_id)))
    }
}

#[async_trait]
impl SnapshotSource for InMemorySource {
    async fn load_client_profile(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientConditionProfile>, SourceError> {
        self.inject(SourceCall::ClientProfile, client_id).await?;
        let client = self.client(client_id)?;

        let preferences = client.preferences.clone().unwrap_or_default();
        Ok(client
            .pre_assessment
            .as_ref()
            .map(|assessment| ClientConditionProfile::from_assessment(assessment, &preferences)))
    }

    async fn load_client_preferences(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientPreferences>, SourceError> {
        self.inject(SourceCall::ClientPreferences, client_id).await?;
        Ok(self.client(client_id)?.preferences.clone())
    }

    async fn load_therapist_profile(&self, therapist_id: &str) -> Result<TherapistProfile, SourceError> {
        self.inject(SourceCall::TherapistProfile, therapist_id).await?;
        Ok(self.therapist(therapist_id)?.profile.clone())
    }

    async fn analyze_conversation(
        &self,
        client_id: &str,
    ) -> Result<Option<ConversationAnalysisResult>, SourceError> {
        self.inject(SourceCall::Conversation, client_id).await?;
        Ok(self.clients.get(client_id).and_then(|c| c.conversation.clone()))
    }

    async fn analyze_client_engagement(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientEngagementAnalysis>, SourceError> {
        self.inject(SourceCall::Engagement, client_id).await?;
        Ok(self.clients.get(client_id).and_then(|c| c.engagement.clone()))
    }

    async fn analyze_therapist_performance(
        &self,
        therapist_id: &str,
    ) -> Result<Option<TherapistPerformanceAnalysis>, SourceError> {
        self.inject(SourceCall::Performance, therapist_id).await?;
        Ok(self
            .therapists
            .get(therapist_id)
            .and_then(|t| t.performance.clone()))
    }

    async fn analyze_review_sentiment(
        &self,
        therapist_id: &str,
    ) -> Result<Option<ReviewSentimentAnalysis>, SourceError> {
        self.inject(SourceCall::ReviewSentiment, therapist_id).await?;
        Ok(self.therapists.get(therapist_id).and_then(|t| {
            t.review_sentiment
                .or_else(|| analytics::review_sentiment(t.profile.approved_ratings()))
        }))
    }
}
