use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::params::{validate_season, EventPath, RacesQuery, SeasonPath};
use crate::api::AppState;
use crate::service::schedule::{self, EventDetail, RaceSummary};

use super::SUCCESS;

#[derive(Debug, Serialize)]
pub struct RacesResponse {
    pub season: i32,
    pub races: Vec<RaceSummary>,
    pub total_races: usize,
    pub status: &'static str,
}

pub async fn list_races(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<SeasonPath>,
    ApiQuery(query): ApiQuery<RacesQuery>,
) -> Result<Json<RacesResponse>, ApiError> {
    let season = validate_season(path.season)?;
    debug!(season, include_completed = query.include_completed, "listing races");

    let races = schedule::race_schedule(state.source.as_ref(), season)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(RacesResponse {
        season,
        total_races: races.len(),
        races,
        status: SUCCESS,
    }))
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub season: i32,
    #[serde(flatten)]
    pub event: EventDetail,
    pub status: &'static str,
}

pub async fn get_event(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<EventPath>,
) -> Result<Json<EventResponse>, ApiError> {
    let (season, round) = path.validate()?;
    let event = schedule::event_info(state.source.as_ref(), season, round)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(EventResponse {
        season,
        event,
        status: SUCCESS,
    }))
}
