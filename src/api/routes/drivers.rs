use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::params::{validate_round, validate_season, DriversQuery, SeasonPath};
use crate::api::AppState;
use crate::service::session::{season_drivers, DriverEntry};

use super::SUCCESS;

#[derive(Debug, Serialize)]
pub struct DriversResponse {
    pub season: i32,
    pub round: u32,
    pub session_type: &'static str,
    pub drivers: Vec<DriverEntry>,
    pub total_drivers: usize,
    pub status: &'static str,
}

pub async fn list_drivers(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<SeasonPath>,
    ApiQuery(query): ApiQuery<DriversQuery>,
) -> Result<Json<DriversResponse>, ApiError> {
    let season = validate_season(path.season)?;
    let round = validate_round(query.race_round)?;

    let (kind, drivers) = season_drivers(state.source.as_ref(), season, round)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(DriversResponse {
        season,
        round,
        session_type: kind.code(),
        total_drivers: drivers.len(),
        drivers,
        status: SUCCESS,
    }))
}
