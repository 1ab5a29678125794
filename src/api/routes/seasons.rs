use axum::Json;

use crate::service::{available_seasons, current_year, SeasonList};

pub async fn list_seasons() -> Json<SeasonList> {
    Json(available_seasons(current_year()))
}
