//! The record-store contract every backend implements.
//!
//! Services depend only on this trait: per entity, filtered reads with
//! equality / set-membership predicates and ordering, inserts that return
//! the created row or a structured error with a distinguishable
//! unique-violation signal, update-by-id, and delete-by-id. Connection
//! management, transactions, and constraint enforcement live behind the
//! trait.

use async_trait::async_trait;

use super::models::{
    AttendanceRecord, EventRecord, EventUpdate, NewAttendance, NewEvent, NewRegistrationRecord,
    PaymentRecord, PaymentUpdate, RegistrationRecord, RegistrationTotals,
};
use crate::domain::{EventId, EventStatus, PaymentStatus, RegistrationId, ValidationCode};

/// Structured store failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The targeted row does not exist (update/delete by id).
    #[error("row not found")]
    NotFound,

    /// An insert hit a unique constraint.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint.
        constraint: String,
    },

    /// Transient transport failure: connection refused, pool timeout,
    /// broken socket. Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Non-transient backend failure: malformed row, query error.
    #[error("store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` if retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Equality filter for event reads. Results are ordered by `event_date`
/// descending.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventFilter {
    /// Restrict to a single status.
    pub status: Option<EventStatus>,
}

/// Predicates for registration reads. Results are ordered by
/// `registration_date` descending.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    /// Restrict to one event.
    pub event_id: Option<EventId>,
    /// Set-membership predicate on payment status. Empty means any.
    pub statuses: Vec<PaymentStatus>,
    /// Case-insensitive substring match on full name or national id.
    pub search: Option<String>,
    /// Optional row cap.
    pub limit: Option<i64>,
}

/// Persistence contract for the four entities.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Inserts an event, returning the created row.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn insert_event(&self, event: NewEvent) -> Result<EventRecord, StoreError>;

    /// Fetches an event by id. `Ok(None)` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn event(&self, id: EventId) -> Result<Option<EventRecord>, StoreError>;

    /// Lists events matching the filter, newest event date first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn list_events(&self, filter: EventFilter) -> Result<Vec<EventRecord>, StoreError>;

    /// Replaces an event's editable columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the row does not exist.
    async fn update_event(&self, id: EventId, update: EventUpdate)
    -> Result<EventRecord, StoreError>;

    /// Sets an event's status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the row does not exist.
    async fn update_event_status(
        &self,
        id: EventId,
        status: EventStatus,
    ) -> Result<EventRecord, StoreError>;

    /// Deletes an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the row does not exist.
    async fn delete_event(&self, id: EventId) -> Result<(), StoreError>;

    /// Inserts a registration, returning the created row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] when the event already has
    /// a registration with the same national id.
    async fn insert_registration(
        &self,
        registration: NewRegistrationRecord,
    ) -> Result<RegistrationRecord, StoreError>;

    /// Fetches a registration by id. `Ok(None)` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<RegistrationRecord>, StoreError>;

    /// Looks a registration up by its unique validation code.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn registration_by_code(
        &self,
        code: &ValidationCode,
    ) -> Result<Option<RegistrationRecord>, StoreError>;

    /// Lists registrations matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn list_registrations(
        &self,
        filter: RegistrationFilter,
    ) -> Result<Vec<RegistrationRecord>, StoreError>;

    /// Applies a payment-status transition to a registration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the row does not exist.
    async fn update_registration_payment(
        &self,
        id: RegistrationId,
        update: PaymentUpdate,
    ) -> Result<RegistrationRecord, StoreError>;

    /// Deletes a registration by id. Dependent-row guards live in the
    /// service layer; this is the raw row delete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the row does not exist.
    async fn delete_registration(&self, id: RegistrationId) -> Result<(), StoreError>;

    /// Recomputes aggregate registration counters, optionally scoped to
    /// one event.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn registration_totals(
        &self,
        event_id: Option<EventId>,
    ) -> Result<RegistrationTotals, StoreError>;

    /// Lists payment rows mirroring the provider state for a registration.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn payments_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Deletes all payment rows for a registration, returning the count.
    /// Used as the cascade step before a registration delete.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn delete_payments_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<u64, StoreError>;

    /// Fetches the attendance row for a registration, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn attendance_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Atomically inserts an attendance row unless one already exists for
    /// the registration. Returns `Ok(None)` when the unique constraint
    /// kept the insert out, so a concurrent duplicate scan can never
    /// produce a second row.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn insert_attendance(
        &self,
        attendance: NewAttendance,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Counts attendance rows, optionally scoped to one event.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on backend failure.
    async fn attendance_count(&self, event_id: Option<EventId>) -> Result<u64, StoreError>;
}
