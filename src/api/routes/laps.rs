use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::params::{LapsQuery, SessionPath};
use crate::api::AppState;
use crate::service::laps::{self, LapEntry, PositionHistory, RankedLap, DEFAULT_TOP_N};
use crate::service::load_session;
use crate::source::types::LoadOptions;

use super::SUCCESS;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LapList {
    All(Vec<LapEntry>),
    Fastest(Vec<RankedLap>),
}

impl LapList {
    fn len(&self) -> usize {
        match self {
            LapList::All(laps) => laps.len(),
            LapList::Fastest(laps) => laps.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LapsResponse {
    pub season: i32,
    pub round: u32,
    pub session_type: &'static str,
    pub driver_filter: Option<String>,
    pub fastest_only: bool,
    pub laps: LapList,
    pub total_laps: usize,
    pub status: &'static str,
}

pub async fn get_laps(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<SessionPath>,
    ApiQuery(query): ApiQuery<LapsQuery>,
) -> Result<Json<LapsResponse>, ApiError> {
    let id = path.session_id()?;
    let top_n = query.top_n()?.map_or(DEFAULT_TOP_N, |n| n as usize);
    let driver = query.driver();

    let session = load_session(state.source.as_ref(), id, LoadOptions::default())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let laps = if query.fastest_only {
        LapList::Fastest(laps::fastest_laps(&session, driver.as_deref(), top_n))
    } else {
        LapList::All(laps::all_laps(&session, driver.as_deref()))
    };

    Ok(Json(LapsResponse {
        season: id.season,
        round: id.round,
        session_type: id.kind.code(),
        driver_filter: driver,
        fastest_only: query.fastest_only,
        total_laps: laps.len(),
        laps,
        status: SUCCESS,
    }))
}

#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub season: i32,
    pub round: u32,
    pub session_type: &'static str,
    #[serde(flatten)]
    pub history: PositionHistory,
    pub status: &'static str,
}

pub async fn get_positions(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<SessionPath>,
) -> Result<Json<PositionsResponse>, ApiError> {
    let id = path.session_id()?;
    let session = load_session(state.source.as_ref(), id, LoadOptions::default())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let history = laps::position_history(&session)?;

    Ok(Json(PositionsResponse {
        season: id.season,
        round: id.round,
        session_type: id.kind.code(),
        history,
        status: SUCCESS,
    }))
}
