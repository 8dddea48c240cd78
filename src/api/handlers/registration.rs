//! Registration handlers: intake, listing, payment transitions, deletion,
//! and CSV export.

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    CreateRegistrationRequest, PaginationMeta, PaginationParams, PaymentResponse,
    PaymentTransitionRequest, RegistrationListResponse, RegistrationQuery, RegistrationResponse,
};
use crate::app_state::AppState;
use crate::domain::{EventId, RegistrationId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{PaymentTransition, RegistrationIntake};

/// `POST /registrations` — Public intake: create a pending registration.
///
/// # Errors
///
/// Returns [`GatewayError`] on malformed fields, a closed event, or a
/// duplicate national id for the event.
#[utoipa::path(
    post,
    path = "/api/v1/registrations",
    tag = "Registrations",
    summary = "Register a participant",
    description = "Creates a pending registration with a fresh validation code and QR payload.",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registration created", body = RegistrationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Already registered for this event", body = ErrorResponse),
    )
)]
pub async fn create_registration(
    State(state): State<AppState>,
    Json(req): Json<CreateRegistrationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let created = state
        .registrations
        .register(RegistrationIntake {
            event_id: EventId::from_uuid(req.event_id),
            full_name: req.full_name,
            national_id: req.national_id,
            address: req.address,
            phone: req.phone,
            injury_notes: req.injury_notes,
            treatment_notes: req.treatment_notes,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse::from(created)),
    ))
}

/// `GET /registrations` — List/filter/search with pagination.
///
/// # Errors
///
/// Returns [`GatewayError`] on an unknown status filter or store failure.
#[utoipa::path(
    get,
    path = "/api/v1/registrations",
    tag = "Registrations",
    summary = "List registrations",
    description = "Filter by event, payment-status set, and name/national-id search, newest first.",
    params(RegistrationQuery, PaginationParams),
    responses(
        (status = 200, description = "Paginated registration list", body = RegistrationListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    )
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    Query(query): Query<RegistrationQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let pagination = pagination.clamped();
    let rows = state.registrations.list(query.into_filter()?).await?;

    let total = rows.len() as u32;
    let per_page = pagination.per_page;
    let page = pagination.page;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let start = ((page - 1) * per_page) as usize;
    let data: Vec<RegistrationResponse> = rows
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(RegistrationResponse::from)
        .collect();

    Ok(Json(RegistrationListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// `GET /registrations/export` — CSV export of the filtered set.
///
/// # Errors
///
/// Returns [`GatewayError::EmptyExport`] when no rows match, so clients
/// show a "no data" notice instead of downloading an empty file.
#[utoipa::path(
    get,
    path = "/api/v1/registrations/export",
    tag = "Registrations",
    summary = "Export registrations as CSV",
    params(RegistrationQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 404, description = "No rows match the filter", body = ErrorResponse),
    )
)]
pub async fn export_registrations(
    State(state): State<AppState>,
    Query(query): Query<RegistrationQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let export = state
        .export
        .export_registrations(query.into_filter()?)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    ))
}

/// `GET /registrations/:id` — Get registration details.
///
/// # Errors
///
/// Returns [`GatewayError::RegistrationNotFound`] if no row matches.
#[utoipa::path(
    get,
    path = "/api/v1/registrations/{id}",
    tag = "Registrations",
    summary = "Get registration details",
    params(
        ("id" = uuid::Uuid, Path, description = "Registration UUID"),
    ),
    responses(
        (status = 200, description = "Registration details", body = RegistrationResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse),
    )
)]
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let registration = state
        .registrations
        .get(RegistrationId::from_uuid(id))
        .await?;
    Ok(Json(RegistrationResponse::from(registration)))
}

/// `GET /registrations/:id/payments` — Provider payment rows.
///
/// # Errors
///
/// Returns [`GatewayError::RegistrationNotFound`] if no row matches.
#[utoipa::path(
    get,
    path = "/api/v1/registrations/{id}/payments",
    tag = "Registrations",
    summary = "List provider payments",
    description = "Payment rows mirroring the provider state for one registration.",
    params(
        ("id" = uuid::Uuid, Path, description = "Registration UUID"),
    ),
    responses(
        (status = 200, description = "Payment rows", body = Vec<PaymentResponse>),
        (status = 404, description = "Registration not found", body = ErrorResponse),
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let payments = state
        .registrations
        .payments(RegistrationId::from_uuid(id))
        .await?;
    let data: Vec<PaymentResponse> = payments.into_iter().map(PaymentResponse::from).collect();
    Ok(Json(data))
}

/// `PATCH /registrations/:id/payment` — Transition the payment status.
///
/// Confirming a payment stamps the payment timestamp and amount.
///
/// # Errors
///
/// Returns [`GatewayError::RegistrationNotFound`] if no row matches.
#[utoipa::path(
    patch,
    path = "/api/v1/registrations/{id}/payment",
    tag = "Registrations",
    summary = "Transition payment status",
    params(
        ("id" = uuid::Uuid, Path, description = "Registration UUID"),
    ),
    request_body = PaymentTransitionRequest,
    responses(
        (status = 200, description = "Updated registration", body = RegistrationResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse),
    )
)]
pub async fn set_payment_status(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PaymentTransitionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let updated = state
        .registrations
        .set_payment_status(
            RegistrationId::from_uuid(id),
            PaymentTransition {
                status: req.payment_status,
                paid_amount: req.paid_amount,
            },
        )
        .await?;
    Ok(Json(RegistrationResponse::from(updated)))
}

/// `DELETE /registrations/:id` — Delete a registration without attendance.
///
/// # Errors
///
/// Returns [`GatewayError::StateConflict`] when attendance is recorded.
#[utoipa::path(
    delete,
    path = "/api/v1/registrations/{id}",
    tag = "Registrations",
    summary = "Delete a registration",
    description = "Rejected when an attendance row exists; payment rows are cascade-deleted first.",
    params(
        ("id" = uuid::Uuid, Path, description = "Registration UUID"),
    ),
    responses(
        (status = 204, description = "Registration deleted"),
        (status = 404, description = "Registration not found", body = ErrorResponse),
        (status = 409, description = "Attendance already recorded", body = ErrorResponse),
    )
)]
pub async fn delete_registration(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .registrations
        .delete(RegistrationId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Registration routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/registrations",
            axum::routing::post(create_registration).get(list_registrations),
        )
        .route("/registrations/export", get(export_registrations))
        .route(
            "/registrations/{id}",
            get(get_registration).delete(delete_registration),
        )
        .route(
            "/registrations/{id}/payment",
            axum::routing::patch(set_payment_status),
        )
        .route("/registrations/{id}/payments", get(list_payments))
}
