use serde::Serialize;
use tracing::warn;

use crate::source::types::{DriverRecord, LoadOptions, Session, SessionId, SessionType};
use crate::source::TimingSource;

use super::format::{format_result_time, format_timestamp, team_color};
use super::{load_session, ServiceError};

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub name: String,
    pub event: String,
    pub date: Option<String>,
    pub total_laps: u32,
}

pub fn session_info(session: &Session) -> SessionInfo {
    SessionInfo {
        name: session.name.clone(),
        event: session.event.name.clone(),
        date: format_timestamp(session.date),
        total_laps: session.total_laps.unwrap_or(0),
    }
}

#[derive(Debug, Serialize)]
pub struct ResultEntry {
    pub position: Option<u32>,
    pub driver_number: String,
    pub driver_code: String,
    pub driver_name: String,
    pub team: String,
    pub team_color: String,
    pub time: Option<String>,
    pub status: Option<String>,
    pub points: f64,
}

/// Final classification, one row per driver.
pub fn session_results(session: &Session) -> Vec<ResultEntry> {
    session
        .results
        .iter()
        .map(|row| ResultEntry {
            position: row.position,
            driver_number: row.driver.driver_number.clone(),
            driver_code: row.driver.abbreviation.clone(),
            driver_name: row.driver.full_name(),
            team: row.driver.team_name.clone(),
            team_color: team_color(row.driver.team_color.as_deref()),
            time: row.time.as_ref().map(format_result_time),
            status: row.status.clone(),
            points: row.points.filter(|p| p.is_finite()).unwrap_or(0.0),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct DriverDetails {
    pub driver_number: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub team: String,
    pub team_color: String,
    pub country_code: String,
}

/// A driver entry. Entries derived from lap data only carry the code.
#[derive(Debug, Serialize)]
pub struct DriverEntry {
    pub driver_code: String,
    #[serde(flatten)]
    pub details: Option<DriverDetails>,
}

impl From<&DriverRecord> for DriverEntry {
    fn from(driver: &DriverRecord) -> Self {
        Self {
            driver_code: driver.abbreviation.clone(),
            details: Some(DriverDetails {
                driver_number: driver.driver_number.clone(),
                first_name: driver.first_name.clone(),
                last_name: driver.last_name.clone(),
                full_name: driver.full_name(),
                team: driver.team_name.clone(),
                team_color: team_color(driver.team_color.as_deref()),
                country_code: driver.country_code.clone().unwrap_or_default(),
            }),
        }
    }
}

/// Drivers of a session from its results, or from lap data when the
/// session has no classification.
pub fn driver_info(session: &Session) -> Vec<DriverEntry> {
    if !session.results.is_empty() {
        return session
            .results
            .iter()
            .map(|row| DriverEntry::from(&row.driver))
            .collect();
    }
    session
        .lap_drivers()
        .into_iter()
        .map(|code| DriverEntry {
            driver_code: code.to_string(),
            details: None,
        })
        .collect()
}

/// Driver list for a season: the race of `round`, falling back to its
/// qualifying session when the race has no usable data.
pub async fn season_drivers(
    source: &dyn TimingSource,
    season: i32,
    round: u32,
) -> Result<(SessionType, Vec<DriverEntry>), ServiceError> {
    let race = SessionId::new(season, round, SessionType::Race);
    match load_session(source, race, LoadOptions::default()).await {
        Ok(session) => {
            let drivers = driver_info(&session);
            if !drivers.is_empty() {
                return Ok((SessionType::Race, drivers));
            }
            warn!(session = %race, "race has no driver data, trying qualifying");
        }
        Err(e) => warn!(session = %race, error = %e, "race unavailable, trying qualifying"),
    }

    let qualifying = SessionId::new(season, round, SessionType::Qualifying);
    let session = load_session(source, qualifying, LoadOptions::default()).await?;
    Ok((SessionType::Qualifying, driver_info(&session)))
}
