//! Registration DTOs: intake, listing, payment transitions, export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{EventId, PaymentStatus};
use crate::error::GatewayError;
use crate::persistence::RegistrationFilter;
use crate::persistence::models::RegistrationRecord;

/// Request body for `POST /registrations`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRegistrationRequest {
    /// Event being registered for.
    pub event_id: uuid::Uuid,
    /// Participant's full name.
    pub full_name: String,
    /// National identity number; punctuation is accepted and stripped.
    pub national_id: String,
    /// Postal address.
    pub address: String,
    /// Contact phone; punctuation is accepted and stripped.
    pub phone: String,
    /// Free-text injury history.
    #[serde(default)]
    pub injury_notes: Option<String>,
    /// Free-text treatment history.
    #[serde(default)]
    pub treatment_notes: Option<String>,
}

/// Request body for `PATCH /registrations/{id}/payment`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentTransitionRequest {
    /// Target payment status.
    pub payment_status: PaymentStatus,
    /// Amount override when confirming a payment.
    #[serde(default)]
    pub paid_amount: Option<f64>,
}

/// Query parameters shared by the list and export endpoints.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct RegistrationQuery {
    /// Restrict to one event.
    #[serde(default)]
    pub event_id: Option<uuid::Uuid>,
    /// Comma-separated payment statuses (e.g. `paid,pending`).
    #[serde(default)]
    pub status: Option<String>,
    /// Case-insensitive substring match on name or national id.
    #[serde(default)]
    pub search: Option<String>,
}

impl RegistrationQuery {
    /// Converts the query into a store filter.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the status list
    /// contains an unknown value.
    pub fn into_filter(self) -> Result<RegistrationFilter, GatewayError> {
        let statuses = match self.status.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(|s| {
                    s.trim()
                        .parse::<PaymentStatus>()
                        .map_err(|e| GatewayError::InvalidRequest(e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(RegistrationFilter {
            event_id: self.event_id.map(EventId::from_uuid),
            statuses,
            search: self.search.filter(|s| !s.trim().is_empty()),
            limit: None,
        })
    }
}

/// Registration representation returned by all registration endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegistrationResponse {
    /// Registration identifier.
    pub id: uuid::Uuid,
    /// Owning event.
    pub event_id: uuid::Uuid,
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
    /// Payment lifecycle state.
    pub payment_status: PaymentStatus,
    /// Amount stamped at confirmation.
    pub paid_amount: Option<f64>,
    /// When the participant registered.
    pub registration_date: DateTime<Utc>,
    /// When the payment was confirmed.
    pub payment_date: Option<DateTime<Utc>>,
    /// Unique check-in code.
    pub validation_code: String,
    /// Structured QR payload issued with the code.
    pub qr_payload: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationRecord> for RegistrationResponse {
    fn from(record: RegistrationRecord) -> Self {
        Self {
            id: (*record.id.as_uuid()),
            event_id: (*record.event_id.as_uuid()),
            full_name: record.full_name,
            national_id: record.national_id,
            address: record.address,
            phone: record.phone,
            injury_notes: record.injury_notes,
            treatment_notes: record.treatment_notes,
            payment_status: record.payment_status,
            paid_amount: record.paid_amount,
            registration_date: record.registration_date,
            payment_date: record.payment_date,
            validation_code: record.validation_code.as_str().to_string(),
            qr_payload: record.qr_payload,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Paginated list response for `GET /registrations`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationListResponse {
    /// Registrations on this page.
    pub data: Vec<RegistrationResponse>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Provider payment row returned by `GET /registrations/{id}/payments`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentResponse {
    /// Payment identifier.
    pub id: uuid::Uuid,
    /// Owning registration.
    pub registration_id: uuid::Uuid,
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
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<crate::persistence::models::PaymentRecord> for PaymentResponse {
    fn from(record: crate::persistence::models::PaymentRecord) -> Self {
        Self {
            id: (*record.id.as_uuid()),
            registration_id: (*record.registration_id.as_uuid()),
            provider_payment_id: record.provider_payment_id,
            amount: record.amount,
            due_date: record.due_date,
            paid_date: record.paid_date,
            status: record.status,
            method: record.method,
            created_at: record.created_at,
        }
    }
}
