use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub deployment: String,
    pub cached_entries: u64,
}

/// Liveness probe
///
/// Does not touch the air quality API; not rate-limited.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        deployment: format!("{:?}", state.config.deployment).to_lowercase(),
        cached_entries: state.response_cache.entry_count(),
    })
}
