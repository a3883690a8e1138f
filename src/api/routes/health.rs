use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub advisor: &'static str,
    pub version: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        advisor: if state.pipeline.advisor().is_enabled() {
            "enabled"
        } else {
            "disabled"
        },
        version: env!("CARGO_PKG_VERSION"),
    })
}
