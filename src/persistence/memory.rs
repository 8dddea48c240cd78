//! In-memory record store.
//!
//! Backs the test suite and local development without a database. All
//! tables live in one `RwLock`'d state, and the implementation enforces
//! the same uniqueness rules the PostgreSQL schema declares, so invariant
//! tests exercise identical semantics.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use super::models::{
    AttendanceRecord, EventRecord, EventUpdate, NewAttendance, NewEvent, NewRegistrationRecord,
    PaymentRecord, PaymentUpdate, RegistrationRecord, RegistrationTotals,
};
use super::record_store::{EventFilter, RecordStore, RegistrationFilter, StoreError};
use crate::domain::{
    AttendanceId, EventId, EventStatus, PaymentStatus, RegistrationId, ValidationCode,
};

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, EventRecord>,
    registrations: HashMap<RegistrationId, RegistrationRecord>,
    payments: Vec<PaymentRecord>,
    attendances: HashMap<RegistrationId, AttendanceRecord>,
}

/// Record store holding all rows in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a payment row, mirroring what a provider webhook would have
    /// written. Used by tests covering the cascade-delete path.
    pub async fn seed_payment(&self, payment: PaymentRecord) {
        self.tables.write().await.payments.push(payment);
    }

    /// Overwrites an event's occupancy counter. No application flow
    /// writes this column, so tests for the deletion guard set it here.
    pub async fn seed_occupied_slots(&self, id: EventId, occupied: i32) {
        if let Some(event) = self.tables.write().await.events.get_mut(&id) {
            event.occupied_slots = occupied;
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn insert_event(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
        let now = Utc::now();
        let record = EventRecord {
            id: EventId::new(),
            name: event.name,
            description: event.description,
            location: event.location,
            event_date: event.event_date,
            event_end_date: event.event_end_date,
            total_slots: event.total_slots,
            occupied_slots: 0,
            fee: event.fee,
            status: EventStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .events
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn event(&self, id: EventId) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn list_events(&self, filter: EventFilter) -> Result<Vec<EventRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<EventRecord> = tables
            .events
            .values()
            .filter(|e| filter.status.is_none_or(|s| e.status == s))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        Ok(events)
    }

    async fn update_event(
        &self,
        id: EventId,
        update: EventUpdate,
    ) -> Result<EventRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables.events.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.name = update.name;
        record.description = update.description;
        record.location = update.location;
        record.event_date = update.event_date;
        record.event_end_date = update.event_end_date;
        record.total_slots = update.total_slots;
        record.fee = update.fee;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn update_event_status(
        &self,
        id: EventId,
        status: EventStatus,
    ) -> Result<EventRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables.events.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.status = status;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_event(&self, id: EventId) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn insert_registration(
        &self,
        registration: NewRegistrationRecord,
    ) -> Result<RegistrationRecord, StoreError> {
        let mut tables = self.tables.write().await;

        // Same constraints the schema declares.
        if tables.registrations.values().any(|r| {
            r.event_id == registration.event_id && r.national_id == registration.national_id
        }) {
            return Err(StoreError::UniqueViolation {
                constraint: "registrations_event_national_id_key".to_string(),
            });
        }
        if tables
            .registrations
            .values()
            .any(|r| r.validation_code == registration.validation_code)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "registrations_validation_code_key".to_string(),
            });
        }

        let now = Utc::now();
        let record = RegistrationRecord {
            id: registration.id,
            event_id: registration.event_id,
            full_name: registration.full_name,
            national_id: registration.national_id,
            address: registration.address,
            phone: registration.phone,
            injury_notes: registration.injury_notes,
            treatment_notes: registration.treatment_notes,
            payment_status: PaymentStatus::Pending,
            paid_amount: None,
            registration_date: now,
            payment_date: None,
            validation_code: registration.validation_code,
            qr_payload: registration.qr_payload,
            created_at: now,
            updated_at: now,
        };
        tables.registrations.insert(record.id, record.clone());
        Ok(record)
    }

    async fn registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        Ok(self.tables.read().await.registrations.get(&id).cloned())
    }

    async fn registration_by_code(
        &self,
        code: &ValidationCode,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .registrations
            .values()
            .find(|r| r.validation_code == *code)
            .cloned())
    }

    async fn list_registrations(
        &self,
        filter: RegistrationFilter,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        let tables = self.tables.read().await;
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut rows: Vec<RegistrationRecord> = tables
            .registrations
            .values()
            .filter(|r| filter.event_id.is_none_or(|id| r.event_id == id))
            .filter(|r| filter.statuses.is_empty() || filter.statuses.contains(&r.payment_status))
            .filter(|r| {
                search.as_deref().is_none_or(|term| {
                    r.full_name.to_lowercase().contains(term) || r.national_id.contains(term)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
        if let Some(limit) = filter.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }

    async fn update_registration_payment(
        &self,
        id: RegistrationId,
        update: PaymentUpdate,
    ) -> Result<RegistrationRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .registrations
            .get_mut(&id)
            .ok_or(StoreError::NotFound)?;
        record.payment_status = update.status;
        if let Some(amount) = update.paid_amount {
            record.paid_amount = Some(amount);
        }
        if let Some(date) = update.payment_date {
            record.payment_date = Some(date);
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_registration(&self, id: RegistrationId) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .registrations
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn registration_totals(
        &self,
        event_id: Option<EventId>,
    ) -> Result<RegistrationTotals, StoreError> {
        let tables = self.tables.read().await;
        let mut totals = RegistrationTotals::default();
        for record in tables
            .registrations
            .values()
            .filter(|r| event_id.is_none_or(|id| r.event_id == id))
        {
            totals.total += 1;
            match record.payment_status {
                PaymentStatus::Paid => {
                    totals.paid += 1;
                    totals.revenue += record.paid_amount.unwrap_or(0.0);
                }
                PaymentStatus::Pending => totals.pending += 1,
                PaymentStatus::Cancelled => totals.cancelled += 1,
                PaymentStatus::Expired => totals.expired += 1,
            }
        }
        Ok(totals)
    }

    async fn payments_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .payments
            .iter()
            .filter(|p| p.registration_id == id)
            .cloned()
            .collect())
    }

    async fn delete_payments_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.payments.len();
        tables.payments.retain(|p| p.registration_id != id);
        Ok((before - tables.payments.len()) as u64)
    }

    async fn attendance_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.tables.read().await.attendances.get(&id).cloned())
    }

    async fn insert_attendance(
        &self,
        attendance: NewAttendance,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.attendances.contains_key(&attendance.registration_id) {
            // Conflict on the registration_id key: insert-if-absent loses.
            return Ok(None);
        }
        let now = Utc::now();
        let record = AttendanceRecord {
            id: AttendanceId::new(),
            registration_id: attendance.registration_id,
            validation_code: attendance.validation_code,
            validated_at: now,
            validated_by: attendance.validated_by,
            validating_device: attendance.validating_device,
            created_at: now,
        };
        tables.attendances.insert(record.registration_id, record.clone());
        Ok(Some(record))
    }

    async fn attendance_count(&self, event_id: Option<EventId>) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .attendances
            .values()
            .filter(|a| {
                event_id.is_none_or(|id| {
                    tables
                        .registrations
                        .get(&a.registration_id)
                        .is_some_and(|r| r.event_id == id)
                })
            })
            .count();
        Ok(count as u64)
    }
}
