use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

pub async fn root() -> Json<Welcome> {
    Json(Welcome {
        status: "healthy",
        message: "Welcome to the F1 Race Replay API",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct Components {
    pub api: &'static str,
    pub source: String,
    pub cache: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub components: Components,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
    pub timestamp: String,
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        components: Components {
            api: "operational",
            source: state.source.name().to_string(),
            cache: if state.cache_dir.is_some() {
                "operational"
            } else {
                "disabled"
            },
        },
        cache_dir: state.cache_dir.as_ref().map(|p| p.display().to_string()),
        timestamp: Utc::now().to_rfc3339(),
    })
}
