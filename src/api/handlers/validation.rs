//! Check-in validation endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ValidateCodeRequest, ValidationResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /validations` — Validate a presented code.
///
/// Accepts a bare validation code or a structured QR payload. Records
/// attendance when the registration is paid and not yet validated; every
/// other outcome is reported without a side effect.
///
/// # Errors
///
/// Returns [`GatewayError`] on an empty code or store failure.
#[utoipa::path(
    post,
    path = "/api/v1/validations",
    tag = "Validation",
    summary = "Validate a check-in code",
    description = "Looks up the registration by code, enforces payment and once-only attendance, and records attendance atomically.",
    request_body = ValidateCodeRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = ValidationResponse),
        (status = 200, description = "Not recorded: unknown code, unpaid, or already validated", body = ValidationResponse),
        (status = 400, description = "Empty code", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn validate_code(
    State(state): State<AppState>,
    Json(req): Json<ValidateCodeRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state.validation.validate(req.into()).await?;
    let status = if outcome.is_validated() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ValidationResponse::from(outcome))))
}

/// Validation routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/validations", post(validate_code))
}
