//! Domain events for the live check-in feed.
//!
//! Every state mutation that an event-day dashboard cares about publishes
//! a [`CheckinEvent`] through the [`super::CheckinFeed`]. Events are
//! broadcast to WebSocket subscribers; counters shown next to them are
//! always recomputed from report queries, never accumulated client-side.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::{EventId, RegistrationId};
use super::status::EventStatus;

/// Domain event emitted after a state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CheckinEvent {
    /// A new registration was created through the intake flow.
    RegistrationCreated {
        /// Event the participant registered for.
        event_id: EventId,
        /// The new registration.
        registration_id: RegistrationId,
        /// Participant's name.
        full_name: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A registration's payment was confirmed.
    PaymentConfirmed {
        /// Owning event.
        event_id: EventId,
        /// The registration transitioned to `paid`.
        registration_id: RegistrationId,
        /// Participant's name.
        full_name: String,
        /// Amount stamped on the registration.
        paid_amount: f64,
        /// Confirmation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Attendance was recorded at the entrance.
    AttendanceRecorded {
        /// Owning event.
        event_id: EventId,
        /// The validated registration.
        registration_id: RegistrationId,
        /// Participant's name.
        full_name: String,
        /// Operator identity that performed the validation.
        validated_by: String,
        /// Validation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An event was activated or deactivated.
    EventStatusChanged {
        /// The affected event.
        event_id: EventId,
        /// New status.
        status: EventStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl CheckinEvent {
    /// Returns the event id this check-in event belongs to.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        match self {
            Self::RegistrationCreated { event_id, .. }
            | Self::PaymentConfirmed { event_id, .. }
            | Self::AttendanceRecorded { event_id, .. }
            | Self::EventStatusChanged { event_id, .. } => *event_id,
        }
    }

    /// Returns the discriminator string used in the wire format.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::RegistrationCreated { .. } => "registration_created",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::AttendanceRecorded { .. } => "attendance_recorded",
            Self::EventStatusChanged { .. } => "event_status_changed",
        }
    }
}
