use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::params::{TelemetryPath, TelemetryQuery};
use crate::api::AppState;
use crate::service::load_session;
use crate::service::telemetry::{lap_telemetry, LapTelemetry};
use crate::source::types::LoadOptions;

use super::SUCCESS;

#[derive(Debug, Serialize)]
pub struct TelemetryResponse {
    pub season: i32,
    pub round: u32,
    pub session_type: &'static str,
    #[serde(flatten)]
    pub lap: LapTelemetry,
    pub status: &'static str,
}

pub async fn get_telemetry(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<TelemetryPath>,
    ApiQuery(query): ApiQuery<TelemetryQuery>,
) -> Result<Json<TelemetryResponse>, ApiError> {
    let id = path.session_id()?;
    let lap_number = query.lap_number()?;

    let session = load_session(state.source.as_ref(), id, LoadOptions::with_telemetry())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let lap = lap_telemetry(state.source.as_ref(), &session, &path.driver, lap_number).await?;

    Ok(Json(TelemetryResponse {
        season: id.season,
        round: id.round,
        session_type: id.kind.code(),
        lap,
        status: SUCCESS,
    }))
}
