//! Event CRUD handlers: create, list, get, update, status toggle, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::api::dto::{EventRequest, EventResponse, EventStatusRequest};
use crate::app_state::AppState;
use crate::domain::{EventId, EventStatus};
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::EventFilter;

/// Query parameters for `GET /events`.
#[derive(Debug, Default, serde::Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    /// Restrict to one status.
    #[serde(default)]
    pub status: Option<EventStatus>,
}

/// `POST /events` — Create a new event.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid fields.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates an event in active status with an empty occupancy counter.",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let created = state.events.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from(created))))
}

/// `GET /events` — List events, optionally filtered by status.
///
/// # Errors
///
/// Returns [`GatewayError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns all events ordered by event date, newest first.",
    params(EventListQuery),
    responses(
        (status = 200, description = "Event list", body = Vec<EventResponse>),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let events = state
        .events
        .list(EventFilter {
            status: query.status,
        })
        .await?;
    let data: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
    Ok(Json(data))
}

/// `GET /events/:id` — Get event details.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event details",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let event = state.events.get(EventId::from_uuid(id)).await?;
    Ok(Json(EventResponse::from(event)))
}

/// `PUT /events/:id` — Replace an event's editable fields.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid fields or a missing event.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Update an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let updated = state
        .events
        .update(EventId::from_uuid(id), req.into())
        .await?;
    Ok(Json(EventResponse::from(updated)))
}

/// `PATCH /events/:id/status` — Activate or deactivate an event.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}/status",
    tag = "Events",
    summary = "Set event status",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = EventStatusRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn set_event_status(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<EventStatusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let updated = state
        .events
        .set_status(EventId::from_uuid(id), req.status)
        .await?;
    Ok(Json(EventResponse::from(updated)))
}

/// `DELETE /events/:id` — Delete an event with no occupied slots.
///
/// # Errors
///
/// Returns [`GatewayError::StateConflict`] while slots are occupied.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Delete an event",
    description = "Rejected while the event's occupancy counter is non-zero.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event has linked registrations", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state.events.delete(EventId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /events/:id/report` — Financial and attendance summary.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/report",
    tag = "Events",
    summary = "Event summary",
    description = "Registration counters, revenue, and attendance count, recomputed on every read.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event summary", body = serde_json::Value),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn event_report(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let summary = state.reports.event_summary(EventId::from_uuid(id)).await?;
    Ok(Json(summary))
}

/// Event management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", axum::routing::post(create_event).get(list_events))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{id}/status", patch(set_event_status))
        .route("/events/{id}/report", get(event_report))
}
