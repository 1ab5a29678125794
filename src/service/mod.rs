//! Data-access layer: loads data through a [`TimingSource`] and reshapes it
//! into JSON-ready structures.

pub mod format;
pub mod laps;
pub mod sampling;
pub mod schedule;
pub mod session;
pub mod telemetry;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::source::types::{LoadOptions, Session, SessionId};
use crate::source::{SourceError, TimingSource};

/// First season with full timing and telemetry coverage.
pub const FIRST_SEASON: i32 = 2018;

const RECOMMENDED_SEASONS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The requested data does not exist (driver without laps, unknown lap, ...).
    #[error("{0}")]
    NotFound(String),

    /// The data source failed to deliver.
    #[error("{0}")]
    Upstream(String),
}

impl From<SourceError> for ServiceError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(message) => ServiceError::NotFound(message),
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

#[derive(Debug, Serialize)]
pub struct SeasonList {
    pub seasons: Vec<i32>,
    pub total: usize,
    pub recommended: Vec<i32>,
    pub note: &'static str,
}

pub fn available_seasons(current_year: i32) -> SeasonList {
    let seasons: Vec<i32> = (FIRST_SEASON..=current_year).collect();
    let recommended = seasons[seasons.len().saturating_sub(RECOMMENDED_SEASONS)..].to_vec();
    SeasonList {
        total: seasons.len(),
        seasons,
        recommended,
        note: "Full telemetry available from 2018 onwards",
    }
}

/// Load a session for one request. The result is owned by the caller and
/// dropped with the response.
pub async fn load_session(
    source: &dyn TimingSource,
    id: SessionId,
    options: LoadOptions,
) -> Result<Session, ServiceError> {
    match source.load_session(id, options).await {
        Ok(session) => {
            info!(session = %id, telemetry = options.telemetry, "loaded session");
            Ok(session)
        }
        Err(e) => {
            error!(session = %id, error = %e, "error loading session");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_span_first_to_current() {
        let list = available_seasons(2025);
        assert_eq!(list.seasons.first(), Some(&2018));
        assert_eq!(list.seasons.last(), Some(&2025));
        assert_eq!(list.total, 8);
        assert_eq!(list.recommended, vec![2023, 2024, 2025]);
    }

    #[test]
    fn recommended_never_exceeds_available() {
        let list = available_seasons(2019);
        assert_eq!(list.recommended, vec![2018, 2019]);
    }

    #[test]
    fn not_found_source_errors_stay_not_found() {
        let err: ServiceError = SourceError::NotFound("Round 99 does not exist".into()).into();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Round 99 does not exist"));

        let err: ServiceError = SourceError::Status {
            url: "http://x/laps".into(),
            status: 502,
        }
        .into();
        assert!(matches!(err, ServiceError::Upstream(ref m) if m.contains("502")));
    }
}
