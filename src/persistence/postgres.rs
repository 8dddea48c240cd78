//! PostgreSQL implementation of the record store.
//!
//! Row structs deriving [`sqlx::FromRow`] keep the SQL column shapes in
//! one place; status strings are parsed into their enums at this boundary
//! so malformed rows surface as [`StoreError::Backend`] instead of
//! leaking into business logic.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use super::models::{
    AttendanceRecord, EventRecord, EventUpdate, NewAttendance, NewEvent, NewRegistrationRecord,
    PaymentRecord, PaymentUpdate, RegistrationRecord, RegistrationTotals,
};
use super::record_store::{EventFilter, RecordStore, RegistrationFilter, StoreError};
use crate::domain::{EventId, EventStatus, RegistrationId, ValidationCode};

/// PostgreSQL-backed record store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a sqlx error to the structured store error, distinguishing the
/// unique-violation signal (SQLSTATE 23505) and transient transport
/// failures from terminal backend failures.
fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) => {
            if db.code().as_deref() == Some("23505") {
                StoreError::UniqueViolation {
                    constraint: db.constraint().unwrap_or("unique").to_string(),
                }
            } else {
                StoreError::Backend(db.to_string())
            }
        }
        sqlx::Error::Io(io) => StoreError::Unavailable(io.to_string()),
        sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool timed out".to_string()),
        sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    location: String,
    event_date: NaiveDate,
    event_end_date: Option<NaiveDate>,
    total_slots: i32,
    occupied_slots: i32,
    fee: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<EventStatus>()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            id: EventId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            location: row.location,
            event_date: row.event_date,
            event_end_date: row.event_end_date,
            total_slots: row.total_slots,
            occupied_slots: row.occupied_slots,
            fee: row.fee,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RegistrationRow {
    id: Uuid,
    event_id: Uuid,
    full_name: String,
    national_id: String,
    address: String,
    phone: String,
    injury_notes: Option<String>,
    treatment_notes: Option<String>,
    payment_status: String,
    paid_amount: Option<f64>,
    registration_date: DateTime<Utc>,
    payment_date: Option<DateTime<Utc>>,
    validation_code: String,
    qr_payload: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for RegistrationRecord {
    type Error = StoreError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        let payment_status = row
            .payment_status
            .parse()
            .map_err(|e: crate::domain::status::UnknownStatus| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            id: RegistrationId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            full_name: row.full_name,
            national_id: row.national_id,
            address: row.address,
            phone: row.phone,
            injury_notes: row.injury_notes,
            treatment_notes: row.treatment_notes,
            payment_status,
            paid_amount: row.paid_amount,
            registration_date: row.registration_date,
            payment_date: row.payment_date,
            validation_code: ValidationCode::from(row.validation_code),
            qr_payload: row.qr_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    registration_id: Uuid,
    provider_payment_id: Option<String>,
    amount: f64,
    due_date: Option<DateTime<Utc>>,
    paid_date: Option<DateTime<Utc>>,
    status: String,
    method: Option<String>,
    provider_payload: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: crate::domain::PaymentId::from_uuid(row.id),
            registration_id: RegistrationId::from_uuid(row.registration_id),
            provider_payment_id: row.provider_payment_id,
            amount: row.amount,
            due_date: row.due_date,
            paid_date: row.paid_date,
            status: row.status,
            method: row.method,
            provider_payload: row.provider_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttendanceRow {
    id: Uuid,
    registration_id: Uuid,
    validation_code: String,
    validated_at: DateTime<Utc>,
    validated_by: String,
    validating_device: String,
    created_at: DateTime<Utc>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        Self {
            id: crate::domain::AttendanceId::from_uuid(row.id),
            registration_id: RegistrationId::from_uuid(row.registration_id),
            validation_code: row.validation_code,
            validated_at: row.validated_at,
            validated_by: row.validated_by,
            validating_device: row.validating_device,
            created_at: row.created_at,
        }
    }
}

const EVENT_COLUMNS: &str = "id, name, description, location, event_date, event_end_date, \
     total_slots, occupied_slots, fee, status, created_at, updated_at";

const REGISTRATION_COLUMNS: &str = "id, event_id, full_name, national_id, address, phone, \
     injury_notes, treatment_notes, payment_status, paid_amount, registration_date, \
     payment_date, validation_code, qr_payload, created_at, updated_at";

#[async_trait::async_trait]
impl RecordStore for PostgresStore {
    async fn insert_event(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events (id, name, description, location, event_date, event_end_date, \
             total_slots, occupied_slots, fee, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.event_date)
        .bind(event.event_end_date)
        .bind(event.total_slots)
        .bind(event.fee)
        .bind(EventStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.try_into()
    }

    async fn event(&self, id: EventId) -> Result<Option<EventRecord>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(EventRecord::try_from).transpose()
    }

    async fn list_events(&self, filter: EventFilter) -> Result<Vec<EventRecord>, StoreError> {
        let rows = if let Some(status) = filter.status {
            sqlx::query_as::<_, EventRow>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE status = $1 ORDER BY event_date DESC"
            ))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, EventRow>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date DESC"
            ))
            .fetch_all(&self.pool)
            .await
        }
        .map_err(map_sqlx_err)?;

        rows.into_iter().map(EventRecord::try_from).collect()
    }

    async fn update_event(
        &self,
        id: EventId,
        update: EventUpdate,
    ) -> Result<EventRecord, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET name = $2, description = $3, location = $4, event_date = $5, \
             event_end_date = $6, total_slots = $7, fee = $8, updated_at = now() \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::from(id))
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.location)
        .bind(update.event_date)
        .bind(update.event_end_date)
        .bind(update.total_slots)
        .bind(update.fee)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(StoreError::NotFound)?;

        row.try_into()
    }

    async fn update_event_status(
        &self,
        id: EventId,
        status: EventStatus,
    ) -> Result<EventRecord, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET status = $2, updated_at = now() \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::from(id))
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(StoreError::NotFound)?;

        row.try_into()
    }

    async fn delete_event(&self, id: EventId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_registration(
        &self,
        registration: NewRegistrationRecord,
    ) -> Result<RegistrationRecord, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO registrations (id, event_id, full_name, national_id, address, phone, \
             injury_notes, treatment_notes, payment_status, validation_code, qr_payload) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10) \
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(Uuid::from(registration.id))
        .bind(Uuid::from(registration.event_id))
        .bind(&registration.full_name)
        .bind(&registration.national_id)
        .bind(&registration.address)
        .bind(&registration.phone)
        .bind(&registration.injury_notes)
        .bind(&registration.treatment_notes)
        .bind(registration.validation_code.as_str())
        .bind(&registration.qr_payload)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.try_into()
    }

    async fn registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(RegistrationRecord::try_from).transpose()
    }

    async fn registration_by_code(
        &self,
        code: &ValidationCode,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE validation_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(RegistrationRecord::try_from).transpose()
    }

    async fn list_registrations(
        &self,
        filter: RegistrationFilter,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE true"
        ));

        if let Some(event_id) = filter.event_id {
            builder.push(" AND event_id = ");
            builder.push_bind(Uuid::from(event_id));
        }
        if !filter.statuses.is_empty() {
            builder.push(" AND payment_status IN (");
            {
                let mut separated = builder.separated(", ");
                for status in &filter.statuses {
                    separated.push_bind(status.as_str());
                }
            }
            builder.push(")");
        }
        if let Some(term) = &filter.search {
            let pattern = format!("%{term}%");
            builder.push(" AND (full_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR national_id ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        builder.push(" ORDER BY registration_date DESC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        let rows: Vec<RegistrationRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.into_iter().map(RegistrationRecord::try_from).collect()
    }

    async fn update_registration_payment(
        &self,
        id: RegistrationId,
        update: PaymentUpdate,
    ) -> Result<RegistrationRecord, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations SET payment_status = $2, \
             paid_amount = COALESCE($3, paid_amount), \
             payment_date = COALESCE($4, payment_date), \
             updated_at = now() \
             WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(Uuid::from(id))
        .bind(update.status.as_str())
        .bind(update.paid_amount)
        .bind(update.payment_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(StoreError::NotFound)?;

        row.try_into()
    }

    async fn delete_registration(&self, id: RegistrationId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn registration_totals(
        &self,
        event_id: Option<EventId>,
    ) -> Result<RegistrationTotals, StoreError> {
        const TOTALS: &str = "SELECT COUNT(*), \
             COUNT(*) FILTER (WHERE payment_status = 'paid'), \
             COUNT(*) FILTER (WHERE payment_status = 'pending'), \
             COUNT(*) FILTER (WHERE payment_status = 'cancelled'), \
             COUNT(*) FILTER (WHERE payment_status = 'expired'), \
             COALESCE(SUM(paid_amount) FILTER (WHERE payment_status = 'paid'), 0) \
             FROM registrations";

        let row: (i64, i64, i64, i64, i64, f64) = if let Some(event_id) = event_id {
            sqlx::query_as(&format!("{TOTALS} WHERE event_id = $1"))
                .bind(Uuid::from(event_id))
                .fetch_one(&self.pool)
                .await
        } else {
            sqlx::query_as(TOTALS).fetch_one(&self.pool).await
        }
        .map_err(map_sqlx_err)?;

        let (total, paid, pending, cancelled, expired, revenue) = row;
        Ok(RegistrationTotals {
            total: total.max(0) as u64,
            paid: paid.max(0) as u64,
            pending: pending.max(0) as u64,
            cancelled: cancelled.max(0) as u64,
            expired: expired.max(0) as u64,
            revenue,
        })
    }

    async fn payments_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, registration_id, provider_payment_id, amount, due_date, paid_date, \
             status, method, provider_payload, created_at, updated_at \
             FROM payments WHERE registration_id = $1 ORDER BY created_at ASC",
        )
        .bind(Uuid::from(id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(rows.into_iter().map(PaymentRecord::from).collect())
    }

    async fn delete_payments_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM payments WHERE registration_id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn attendance_for_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            "SELECT id, registration_id, validation_code, validated_at, validated_by, \
             validating_device, created_at \
             FROM attendances WHERE registration_id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(AttendanceRecord::from))
    }

    async fn insert_attendance(
        &self,
        attendance: NewAttendance,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        // ON CONFLICT DO NOTHING makes check-then-insert safe under
        // concurrent duplicate scans: the loser observes None.
        let row = sqlx::query_as::<_, AttendanceRow>(
            "INSERT INTO attendances (id, registration_id, validation_code, validated_by, \
             validating_device) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (registration_id) DO NOTHING \
             RETURNING id, registration_id, validation_code, validated_at, validated_by, \
             validating_device, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(Uuid::from(attendance.registration_id))
        .bind(&attendance.validation_code)
        .bind(&attendance.validated_by)
        .bind(&attendance.validating_device)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(AttendanceRecord::from))
    }

    async fn attendance_count(&self, event_id: Option<EventId>) -> Result<u64, StoreError> {
        let count: i64 = if let Some(event_id) = event_id {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM attendances a \
                 JOIN registrations r ON r.id = a.registration_id \
                 WHERE r.event_id = $1",
            )
            .bind(Uuid::from(event_id))
            .fetch_one(&self.pool)
            .await
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM attendances")
                .fetch_one(&self.pool)
                .await
        }
        .map_err(map_sqlx_err)?;

        Ok(count.max(0) as u64)
    }
}
