pub mod openf1;
pub mod telemetry;
pub mod types;

use async_trait::async_trait;

use types::{EventRecord, LapRecord, LoadOptions, Session, SessionId, TelemetryFrame};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("telemetry was not loaded for session {0}")]
    TelemetryNotLoaded(SessionId),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

/// Provider of schedules, sessions and lap telemetry.
///
/// Implementations own their network access and on-disk caching. Every call
/// is independent: nothing loaded here is shared between requests.
#[async_trait]
pub trait TimingSource: Send + Sync {
    /// Short name reported by the health endpoint.
    fn name(&self) -> &'static str;

    /// Every event of a season, testing included, in calendar order.
    async fn event_schedule(&self, season: i32) -> Result<Vec<EventRecord>, SourceError>;

    async fn load_session(
        &self,
        id: SessionId,
        options: LoadOptions,
    ) -> Result<Session, SourceError>;

    /// Channel data for one lap of a session loaded with telemetry enabled.
    async fn lap_telemetry(
        &self,
        session: &Session,
        lap: &LapRecord,
    ) -> Result<TelemetryFrame, SourceError>;

    async fn event(&self, season: i32, round: u32) -> Result<EventRecord, SourceError> {
        self.event_schedule(season)
            .await?
            .into_iter()
            .find(|event| event.round == round && !event.is_testing())
            .ok_or_else(|| {
                SourceError::NotFound(format!(
                    "Round {} does not exist in the {} season",
                    round, season
                ))
            })
    }
}
