use serde::Deserialize;

use crate::service::{current_year, FIRST_SEASON};
use crate::source::types::{SessionId, SessionType};

use super::error::ApiError;

// -----------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------

pub fn validate_season(season: i32) -> Result<i32, ApiError> {
    let current = current_year();
    if !(FIRST_SEASON..=current).contains(&season) {
        return Err(ApiError::bad_request(format!(
            "Season must be between {} and {}",
            FIRST_SEASON, current
        )));
    }
    Ok(season)
}

pub fn validate_round(round: u32) -> Result<u32, ApiError> {
    if round == 0 {
        return Err(ApiError::bad_request("Round must be a positive integer"));
    }
    Ok(round)
}

pub fn parse_session_type(value: &str) -> Result<SessionType, ApiError> {
    value
        .parse::<SessionType>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

fn positive(name: &str, value: Option<u32>) -> Result<Option<u32>, ApiError> {
    match value {
        Some(0) => Err(ApiError::bad_request(format!(
            "{} must be a positive integer",
            name
        ))),
        other => Ok(other),
    }
}

// -----------------------------------------------------------------------
// Path parameters
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SeasonPath {
    pub season: i32,
}

#[derive(Debug, Deserialize)]
pub struct EventPath {
    pub season: i32,
    pub round: u32,
}

impl EventPath {
    pub fn validate(&self) -> Result<(i32, u32), ApiError> {
        Ok((validate_season(self.season)?, validate_round(self.round)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionPath {
    pub season: i32,
    pub round: u32,
    pub session_type: String,
}

impl SessionPath {
    pub fn session_id(&self) -> Result<SessionId, ApiError> {
        Ok(SessionId::new(
            validate_season(self.season)?,
            validate_round(self.round)?,
            parse_session_type(&self.session_type)?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct TelemetryPath {
    pub season: i32,
    pub round: u32,
    pub session_type: String,
    pub driver: String,
}

impl TelemetryPath {
    pub fn session_id(&self) -> Result<SessionId, ApiError> {
        Ok(SessionId::new(
            validate_season(self.season)?,
            validate_round(self.round)?,
            parse_session_type(&self.session_type)?,
        ))
    }
}

// -----------------------------------------------------------------------
// Query parameters
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RacesQuery {
    /// Accepted for compatibility; the schedule is never filtered by it.
    #[serde(default = "default_true")]
    pub include_completed: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct LapsQuery {
    pub driver: Option<String>,
    #[serde(default)]
    pub fastest_only: bool,
    pub top_n: Option<u32>,
}

impl LapsQuery {
    pub fn driver(&self) -> Option<String> {
        self.driver
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_ascii_uppercase)
    }

    pub fn top_n(&self) -> Result<Option<u32>, ApiError> {
        positive("top_n", self.top_n)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TelemetryQuery {
    pub lap_number: Option<u32>,
}

impl TelemetryQuery {
    pub fn lap_number(&self) -> Result<Option<u32>, ApiError> {
        positive("lap_number", self.lap_number)
    }
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    #[serde(default = "default_track_session")]
    pub session_type: String,
}

fn default_track_session() -> String {
    "R".to_string()
}

#[derive(Debug, Deserialize)]
pub struct DriversQuery {
    #[serde(default = "default_race_round")]
    pub race_round: u32,
}

fn default_race_round() -> u32 {
    1
}
