//! Typed row structs for the four store entities.
//!
//! Row shapes mirror the database schema exactly; untyped rows never
//! cross the persistence boundary. `New*` structs carry the caller-chosen
//! columns for inserts, with server-side columns (ids, timestamps,
//! defaults) filled in by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AttendanceId, EventId, EventStatus, PaymentId, PaymentStatus, RegistrationId, ValidationCode,
};

/// A row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Primary key.
    pub id: EventId,
    /// Event name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Venue.
    pub location: String,
    /// First (or only) day of the event.
    pub event_date: NaiveDate,
    /// Last day for multi-day events.
    pub event_end_date: Option<NaiveDate>,
    /// Capacity.
    pub total_slots: i32,
    /// Stored occupancy counter. Never written by the intake flow; see
    /// the deletion guard in the event service for its one consumer.
    pub occupied_slots: i32,
    /// Registration fee. Zero means a free event.
    pub fee: f64,
    /// `active` or `inactive`.
    pub status: EventStatus,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last row update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Caller-chosen columns for an event insert.
#[derive(Debug, Clone)]
pub struct NewEvent {
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
    /// Registration fee.
    pub fee: f64,
}

/// Replacement columns for an event update.
#[derive(Debug, Clone)]
pub struct EventUpdate {
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
    /// Registration fee.
    pub fee: f64,
}

/// A row from the `registrations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Primary key.
    pub id: RegistrationId,
    /// Owning event.
    pub event_id: EventId,
    /// Participant's full name.
    pub full_name: String,
    /// National identity number, digits only. Unique per event.
    pub national_id: String,
    /// Postal address.
    pub address: String,
    /// Contact phone, digits only.
    pub phone: String,
    /// Free-text injury history.
    pub injury_notes: Option<String>,
    /// Free-text treatment history.
    pub treatment_notes: Option<String>,
    /// Payment lifecycle state.
    pub payment_status: PaymentStatus,
    /// Amount stamped when the payment was confirmed.
    pub paid_amount: Option<f64>,
    /// When the participant registered.
    pub registration_date: DateTime<Utc>,
    /// When the payment was confirmed.
    pub payment_date: Option<DateTime<Utc>>,
    /// Unique check-in code.
    pub validation_code: ValidationCode,
    /// Structured QR payload issued with the code.
    pub qr_payload: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last row update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Caller-chosen columns for a registration insert.
///
/// The id is chosen by the caller (not the store) so the QR payload,
/// which embeds the registration id, can be generated before the insert.
#[derive(Debug, Clone)]
pub struct NewRegistrationRecord {
    /// Caller-generated primary key.
    pub id: RegistrationId,
    /// Owning event.
    pub event_id: EventId,
    /// Participant's full name.
    pub full_name: String,
    /// National identity number, digits only.
    pub national_id: String,
    /// Postal address.
    pub address: String,
    /// Contact phone, digits only.
    pub phone: String,
    /// Free-text injury history.
    pub injury_notes: Option<String>,
    /// Free-text treatment history.
    pub treatment_notes: Option<String>,
    /// Freshly issued check-in code.
    pub validation_code: ValidationCode,
    /// Structured QR payload for the code.
    pub qr_payload: Option<String>,
}

/// Payment-status transition columns.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    /// New payment status.
    pub status: PaymentStatus,
    /// Amount to stamp, when transitioning to `paid`.
    pub paid_amount: Option<f64>,
    /// Confirmation timestamp, when transitioning to `paid`.
    pub payment_date: Option<DateTime<Utc>>,
}

/// A row from the `payments` table.
///
/// Mirrors a third-party payment provider's state. The gateway persists
/// and cascade-deletes these rows; provider webhooks are a future
/// integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Primary key.
    pub id: PaymentId,
    /// Owning registration.
    pub registration_id: RegistrationId,
    /// Provider-side payment id.
    pub provider_payment_id: Option<String>,
    /// Charged amount.
    pub amount: f64,
    /// Payment due date.
    pub due_date: Option<DateTime<Utc>>,
    /// When the provider confirmed the payment.
    pub paid_date: Option<DateTime<Utc>>,
    /// Provider-side status string.
    pub status: String,
    /// Payment method label.
    pub method: Option<String>,
    /// Raw provider callback payload.
    pub provider_payload: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last row update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A row from the `attendances` table. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Primary key.
    pub id: AttendanceId,
    /// The validated registration. Unique: one attendance per registration.
    pub registration_id: RegistrationId,
    /// The code that was presented.
    pub validation_code: String,
    /// When the validation happened.
    pub validated_at: DateTime<Utc>,
    /// Operator identity.
    pub validated_by: String,
    /// Device label of the validating client.
    pub validating_device: String,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Caller-chosen columns for an attendance insert.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    /// The registration being validated.
    pub registration_id: RegistrationId,
    /// The code that was presented.
    pub validation_code: String,
    /// Operator identity.
    pub validated_by: String,
    /// Device label of the validating client.
    pub validating_device: String,
}

/// Aggregate registration counters, recomputed from the store on read.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RegistrationTotals {
    /// All registrations in scope.
    pub total: u64,
    /// Registrations with confirmed payment.
    pub paid: u64,
    /// Registrations awaiting payment.
    pub pending: u64,
    /// Cancelled registrations.
    pub cancelled: u64,
    /// Expired registrations.
    pub expired: u64,
    /// Sum of `paid_amount` over paid registrations.
    pub revenue: f64,
}
