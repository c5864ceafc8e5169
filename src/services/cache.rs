use crate::models::{
    ClientConditionProfile, ClientEngagementAnalysis, ClientPreferences,
    ConversationAnalysisResult, ReviewSentimentAnalysis, TherapistPerformanceAnalysis,
    TherapistProfile,
};
use crate::services::source::{SnapshotSource, SourceError};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Caching decorator over any snapshot source
///
/// Analysis snapshots are cached in memory with a TTL. Concurrent requests
/// for the same key share one in-flight load, so a batch asking for the same
/// client engagement N times hits the inner source once. Errors are not
/// cached. Profiles and preferences always go to the inner source.
pub struct CachedSource {
    inner: Arc<dyn SnapshotSource>,
    conversations: Cache<String, Option<ConversationAnalysisResult>>,
    engagement: Cache<String, Option<ClientEngagementAnalysis>>,
    performance: Cache<String, Option<TherapistPerformanceAnalysis>>,
    sentiment: Cache<String, Option<ReviewSentimentAnalysis>>,
}

impl CachedSource {
    /// Wrap `inner`, holding up to `capacity` entries per snapshot kind
    pub fn new(inner: Arc<dyn SnapshotSource>, capacity: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);

        Self {
            inner,
            conversations: build_cache(capacity, ttl),
            engagement: build_cache(capacity, ttl),
            performance: build_cache(capacity, ttl),
            sentiment: build_cache(capacity, ttl),
        }
    }

    /// Drop every cached snapshot
    pub fn invalidate_all(&self) {
        self.conversations.invalidate_all();
        self.engagement.invalidate_all();
        self.performance.invalidate_all();
        self.sentiment.invalidate_all();
        tracing::debug!("Snapshot cache cleared");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            conversations: self.conversations.entry_count(),
            engagement: self.engagement.entry_count(),
            performance: self.performance.entry_count(),
            sentiment: self.sentiment.entry_count(),
        }
    }
}

fn build_cache<V>(capacity: u64, ttl: Duration) -> Cache<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(ttl)
        .build()
}

/// Approximate entry counts per snapshot kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub conversations: u64,
    pub engagement: u64,
    pub performance: u64,
    pub sentiment: u64,
}

/// moka hands shared errors back behind an `Arc`
fn unshare(error: Arc<SourceError>) -> SourceError {
    (*error).clone()
}

#[async_trait]
impl SnapshotSource for CachedSource {
    async fn load_client_profile(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientConditionProfile>, SourceError> {
        self.inner.load_client_profile(client_id).await
    }

    async fn load_client_preferences(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientPreferences>, SourceError> {
        self.inner.load_client_preferences(client_id).await
    }

    async fn load_therapist_profile(&self, therapist_id: &str) -> Result<TherapistProfile, SourceError> {
        self.inner.load_therapist_profile(therapist_id).await
    }

    async fn analyze_conversation(
        &self,
        client_id: &str,
    ) -> Result<Option<ConversationAnalysisResult>, SourceError> {
        self.conversations
            .try_get_with(client_id.to_string(), self.inner.analyze_conversation(client_id))
            .await
            .map_err(unshare)
    }

    async fn analyze_client_engagement(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientEngagementAnalysis>, SourceError> {
        self.engagement
            .try_get_with(client_id.to_string(), self.inner.analyze_client_engagement(client_id))
            .await
            .map_err(unshare)
    }

    async fn analyze_therapist_performance(
        &self,
        therapist_id: &str,
    ) -> Result<Option<TherapistPerformanceAnalysis>, SourceError> {
        self.performance
            .try_get_with(
                therapist_id.to_string(),
                self.inner.analyze_therapist_performance(therapist_id),
            )
            .await
            .map_err(unshare)
    }

    async fn analyze_review_sentiment(
        &self,
        therapist_id: &str,
    ) -> Result<Option<ReviewSentimentAnalysis>, SourceError> {
        self.sentiment
            .try_get_with(
                therapist_id.to_string(),
                self.inner.analyze_review_sentiment(therapist_id),
            )
            .await
            .map_err(unshare)
    }
}
