use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::params::{parse_session_type, EventPath, TrackQuery};
use crate::api::AppState;
use crate::service::load_session;
use crate::service::telemetry::{track_layout, TrackLayout};
use crate::source::types::{LoadOptions, SessionId};

use super::SUCCESS;

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub season: i32,
    pub round: u32,
    pub session_type: &'static str,
    #[serde(flatten)]
    pub track: TrackLayout,
    pub status: &'static str,
}

pub async fn get_track(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<EventPath>,
    ApiQuery(query): ApiQuery<TrackQuery>,
) -> Result<Json<TrackResponse>, ApiError> {
    let (season, round) = path.validate()?;
    let id = SessionId::new(season, round, parse_session_type(&query.session_type)?);

    let session = load_session(state.source.as_ref(), id, LoadOptions::with_telemetry())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let track = track_layout(state.source.as_ref(), &session).await?;

    Ok(Json(TrackResponse {
        season,
        round,
        session_type: id.kind.code(),
        track,
        status: SUCCESS,
    }))
}
