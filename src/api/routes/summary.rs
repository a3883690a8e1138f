use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::pipeline::{CoachReport, SummaryQuery};

/// `GET /api/summary?summoner=<name>&platform=<token>`
pub async fn get_summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<CoachReport>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let report = state.pipeline.run(&query).await?;
    info!(
        games = report.summary.games,
        "Summarized {} on {}", report.player.display_name, report.player.platform
    );
    Ok(Json(report))
}
