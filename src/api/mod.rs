pub mod error;
pub mod extract;
pub mod params;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::source::TimingSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn TimingSource>,
    /// `None` when running uncached.
    pub cache_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(source: Arc<dyn TimingSource>, cache_dir: Option<PathBuf>) -> Self {
        Self { source, cache_dir }
    }
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        .route("/api/seasons", get(routes::seasons::list_seasons))
        .route("/api/races/{season}", get(routes::races::list_races))
        .route("/api/event/{season}/{round}", get(routes::races::get_event))
        .route(
            "/api/session/{season}/{round}/{session_type}",
            get(routes::sessions::get_session),
        )
        .route(
            "/api/laps/{season}/{round}/{session_type}",
            get(routes::laps::get_laps),
        )
        .route(
            "/api/positions/{season}/{round}/{session_type}",
            get(routes::laps::get_positions),
        )
        .route(
            "/api/telemetry/{season}/{round}/{session_type}/{driver}",
            get(routes::telemetry::get_telemetry),
        )
        .route("/api/track/{season}/{round}", get(routes::track::get_track))
        .route("/api/drivers/{season}", get(routes::drivers::list_drivers))
        .fallback(error::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
