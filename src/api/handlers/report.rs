//! Global summary endpoint.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::app_state::AppState;
use crate::error::GatewayError;

/// `GET /report` — Summary across all events.
///
/// # Errors
///
/// Returns [`GatewayError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/report",
    tag = "Reports",
    summary = "Global summary",
    description = "Registration counters, revenue, and attendance count across all events.",
    responses(
        (status = 200, description = "Summary", body = serde_json::Value),
    )
)]
pub async fn global_report(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let summary = state.reports.global_summary().await?;
    Ok(Json(summary))
}

/// Report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/report", get(global_report))
}
