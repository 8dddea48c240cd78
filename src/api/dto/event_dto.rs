//! Event DTOs for create, update, and list operations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::EventStatus;
use crate::persistence::models::{EventRecord, EventUpdate, NewEvent};

/// Request body for `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EventRequest {
    /// Event name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Venue.
    pub location: String,
    /// First (or only) day of the event.
    pub event_date: NaiveDate,
    /// Last day for multi-day events.
    #[serde(default)]
    pub event_end_date: Option<NaiveDate>,
    /// Capacity.
    pub total_slots: i32,
    /// Registration fee. Zero means a free event.
    #[serde(default)]
    pub fee: f64,
}

impl From<EventRequest> for NewEvent {
    fn from(req: EventRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            location: req.location,
            event_date: req.event_date,
            event_end_date: req.event_end_date,
            total_slots: req.total_slots,
            fee: req.fee,
        }
    }
}

impl From<EventRequest> for EventUpdate {
    fn from(req: EventRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            location: req.location,
            event_date: req.event_date,
            event_end_date: req.event_end_date,
            total_slots: req.total_slots,
            fee: req.fee,
        }
    }
}

/// Request body for `PATCH /events/{id}/status`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EventStatusRequest {
    /// Target status.
    pub status: EventStatus,
}

/// Event representation returned by all event endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventResponse {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Event name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Venue.
    pub location: String,
    /// First day.
    pub event_date: NaiveDate,
    /// Last day for multi-day events.
    pub event_end_date: Option<NaiveDate>,
    /// Capacity.
    pub total_slots: i32,
    /// Stored occupancy counter.
    pub occupied_slots: i32,
    /// Registration fee.
    pub fee: f64,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<EventRecord> for EventResponse {
    fn from(record: EventRecord) -> Self {
        Self {
            id: (*record.id.as_uuid()),
            name: record.name,
            description: record.description,
            location: record.location,
            event_date: record.event_date,
            event_end_date: record.event_end_date,
            total_slots: record.total_slots,
            occupied_slots: record.occupied_slots,
            fee: record.fee,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
