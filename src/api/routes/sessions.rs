use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::ApiPath;
use crate::api::params::SessionPath;
use crate::api::AppState;
use crate::service::load_session;
use crate::service::session::{
    driver_info, session_info, session_results, DriverEntry, ResultEntry, SessionInfo,
};
use crate::source::types::LoadOptions;

use super::SUCCESS;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub season: i32,
    pub round: u32,
    pub session_type: &'static str,
    pub session: SessionInfo,
    pub results: Vec<ResultEntry>,
    pub drivers: Vec<DriverEntry>,
    pub status: &'static str,
}

pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<SessionPath>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = path.session_id()?;
    let session = load_session(state.source.as_ref(), id, LoadOptions::default())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(SessionResponse {
        season: id.season,
        round: id.round,
        session_type: id.kind.code(),
        session: session_info(&session),
        results: session_results(&session),
        drivers: driver_info(&session),
        status: SUCCESS,
    }))
}
