use serde::Serialize;
use tracing::error;

use crate::source::types::{EventRecord, SessionType};
use crate::source::TimingSource;

use super::format::format_timestamp;
use super::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct RaceSummary {
    pub round: u32,
    pub name: String,
    pub country: String,
    pub location: String,
    pub date: Option<String>,
    pub event_format: String,
}

impl From<&EventRecord> for RaceSummary {
    fn from(event: &EventRecord) -> Self {
        Self {
            round: event.round,
            name: event.name.clone(),
            country: event.country.clone(),
            location: event.location.clone(),
            date: format_timestamp(event.date),
            event_format: event.format.clone(),
        }
    }
}

/// Race weekends of a season, testing excluded.
pub async fn race_schedule(
    source: &dyn TimingSource,
    season: i32,
) -> Result<Vec<RaceSummary>, ServiceError> {
    let events = source.event_schedule(season).await.map_err(|e| {
        error!(season, error = %e, "error fetching race schedule");
        ServiceError::from(e)
    })?;
    Ok(events
        .iter()
        .filter(|event| !event.is_testing())
        .map(RaceSummary::from)
        .collect())
}

#[derive(Debug, Serialize)]
pub struct SessionDates {
    pub fp1: Option<String>,
    pub fp2: Option<String>,
    pub fp3: Option<String>,
    pub qualifying: Option<String>,
    pub sprint: Option<String>,
    pub race: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub summary: RaceSummary,
    pub sessions: SessionDates,
}

pub async fn event_info(
    source: &dyn TimingSource,
    season: i32,
    round: u32,
) -> Result<EventDetail, ServiceError> {
    let event = source.event(season, round).await.map_err(|e| {
        error!(season, round, error = %e, "error fetching event info");
        ServiceError::from(e)
    })?;
    let date_of = |kind| format_timestamp(event.session(kind).and_then(|s| s.date));
    Ok(EventDetail {
        sessions: SessionDates {
            fp1: date_of(SessionType::Practice1),
            fp2: date_of(SessionType::Practice2),
            fp3: date_of(SessionType::Practice3),
            qualifying: date_of(SessionType::Qualifying),
            sprint: date_of(SessionType::Sprint),
            race: date_of(SessionType::Race),
        },
        summary: RaceSummary::from(&event),
    })
}
