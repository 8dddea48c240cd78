//! Registration intake and administrative registration operations.
//!
//! Intake re-checks server-side what the public form enforces in the
//! browser: required fields, national-id and phone shape, and an open
//! event. The store's unique constraint is the authority on "already
//! registered for this event"; this service only translates its signal.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    CheckinEvent, CheckinFeed, EventStatus, PaymentStatus, QrPayload, RegistrationId,
    ValidationCode,
};
use crate::error::GatewayError;
use crate::persistence::models::{
    NewRegistrationRecord, PaymentUpdate, RegistrationRecord,
};
use crate::persistence::{RecordStore, RegistrationFilter, StoreError};

/// Digits required in a national id after stripping punctuation.
const NATIONAL_ID_LEN: usize = 11;

/// Participant data collected by the public registration form.
#[derive(Debug, Clone)]
pub struct RegistrationIntake {
    /// Event being registered for.
    pub event_id: crate::domain::EventId,
    /// Participant's full name.
    pub full_name: String,
    /// National identity number; punctuation is stripped before storage.
    pub national_id: String,
    /// Postal address.
    pub address: String,
    /// Contact phone; punctuation is stripped before storage.
    pub phone: String,
    /// Free-text injury history.
    pub injury_notes: Option<String>,
    /// Free-text treatment history.
    pub treatment_notes: Option<String>,
}

/// Payment-status transition requested by an administrator.
#[derive(Debug, Clone)]
pub struct PaymentTransition {
    /// Target status.
    pub status: PaymentStatus,
    /// Amount override; defaults to the already-stamped amount or zero.
    pub paid_amount: Option<f64>,
}

/// Registration lifecycle operations.
#[derive(Debug)]
pub struct RegistrationService {
    store: Arc<dyn RecordStore>,
    feed: CheckinFeed,
}

impl RegistrationService {
    /// Creates a new `RegistrationService`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, feed: CheckinFeed) -> Self {
        Self { store, feed }
    }

    /// Creates a pending registration with a fresh validation code and
    /// QR payload.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] on malformed fields,
    /// [`GatewayError::EventNotFound`] / [`GatewayError::StateConflict`]
    /// when the event is missing or inactive, and
    /// [`GatewayError::ConstraintViolation`] when the national id is
    /// already registered for the event.
    pub async fn register(
        &self,
        intake: RegistrationIntake,
    ) -> Result<RegistrationRecord, GatewayError> {
        let full_name = intake.full_name.trim();
        if full_name.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "full name is required".to_string(),
            ));
        }
        let address = intake.address.trim();
        if address.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "address is required".to_string(),
            ));
        }
        let national_id = digits_of(&intake.national_id);
        if national_id.len() != NATIONAL_ID_LEN {
            return Err(GatewayError::InvalidRequest(format!(
                "national id must have {NATIONAL_ID_LEN} digits"
            )));
        }
        let phone = digits_of(&intake.phone);
        if !(10..=11).contains(&phone.len()) {
            return Err(GatewayError::InvalidRequest(
                "phone must have 10 or 11 digits".to_string(),
            ));
        }

        let event = self
            .store
            .event(intake.event_id)
            .await?
            .ok_or(GatewayError::EventNotFound(*intake.event_id.as_uuid()))?;
        if event.status != EventStatus::Active {
            return Err(GatewayError::StateConflict(
                "event is not open for registrations".to_string(),
            ));
        }

        let registration_id = RegistrationId::new();
        let code = ValidationCode::generate();
        let qr_payload = QrPayload::new(&code, full_name, registration_id)
            .encode()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        let created = self
            .store
            .insert_registration(NewRegistrationRecord {
                id: registration_id,
                event_id: event.id,
                full_name: full_name.to_string(),
                national_id,
                address: address.to_string(),
                phone,
                injury_notes: none_if_blank(intake.injury_notes),
                treatment_notes: none_if_blank(intake.treatment_notes),
                validation_code: code,
                qr_payload: Some(qr_payload),
            })
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation { .. } => GatewayError::ConstraintViolation(
                    "this national id is already registered for this event".to_string(),
                ),
                other => GatewayError::Store(other),
            })?;

        tracing::info!(
            registration_id = %created.id,
            event_id = %created.event_id,
            "registration created"
        );
        let _ = self.feed.publish(CheckinEvent::RegistrationCreated {
            event_id: created.event_id,
            registration_id: created.id,
            full_name: created.full_name.clone(),
            timestamp: Utc::now(),
        });

        Ok(created)
    }

    /// Lists registrations matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] on store failure.
    pub async fn list(
        &self,
        filter: RegistrationFilter,
    ) -> Result<Vec<RegistrationRecord>, GatewayError> {
        Ok(self.store.list_registrations(filter).await?)
    }

    /// Fetches a registration by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RegistrationNotFound`] when no row matches.
    pub async fn get(&self, id: RegistrationId) -> Result<RegistrationRecord, GatewayError> {
        self.store
            .registration(id)
            .await?
            .ok_or(GatewayError::RegistrationNotFound(*id.as_uuid()))
    }

    /// Applies a payment-status transition.
    ///
    /// Transitioning into `paid` stamps the payment timestamp and amount;
    /// other transitions leave both untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RegistrationNotFound`] when no row matches.
    pub async fn set_payment_status(
        &self,
        id: RegistrationId,
        transition: PaymentTransition,
    ) -> Result<RegistrationRecord, GatewayError> {
        let current = self.get(id).await?;

        let becoming_paid = transition.status == PaymentStatus::Paid
            && current.payment_status != PaymentStatus::Paid;
        let update = if becoming_paid {
            PaymentUpdate {
                status: transition.status,
                paid_amount: Some(
                    transition
                        .paid_amount
                        .or(current.paid_amount)
                        .unwrap_or(0.0),
                ),
                payment_date: Some(Utc::now()),
            }
        } else {
            PaymentUpdate {
                status: transition.status,
                paid_amount: None,
                payment_date: None,
            }
        };

        let updated = self.store.update_registration_payment(id, update).await?;

        tracing::info!(
            registration_id = %updated.id,
            status = %updated.payment_status,
            "payment status updated"
        );
        if becoming_paid {
            let _ = self.feed.publish(CheckinEvent::PaymentConfirmed {
                event_id: updated.event_id,
                registration_id: updated.id,
                full_name: updated.full_name.clone(),
                paid_amount: updated.paid_amount.unwrap_or(0.0),
                timestamp: Utc::now(),
            });
        }

        Ok(updated)
    }

    /// Lists the provider payment rows mirrored for a registration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RegistrationNotFound`] when no row matches.
    pub async fn payments(
        &self,
        id: RegistrationId,
    ) -> Result<Vec<crate::persistence::models::PaymentRecord>, GatewayError> {
        let registration = self.get(id).await?;
        Ok(self
            .store
            .payments_for_registration(registration.id)
            .await?)
    }

    /// Deletes a registration and its payment rows.
    ///
    /// Rejected while an attendance row references the registration; the
    /// payment cascade runs only once the guard passes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RegistrationNotFound`] when no row matches
    /// and [`GatewayError::StateConflict`] when attendance exists.
    pub async fn delete(&self, id: RegistrationId) -> Result<(), GatewayError> {
        let registration = self.get(id).await?;

        if self
            .store
            .attendance_for_registration(registration.id)
            .await?
            .is_some()
        {
            return Err(GatewayError::StateConflict(
                "registration has a recorded attendance and cannot be deleted".to_string(),
            ));
        }

        let removed_payments = self
            .store
            .delete_payments_for_registration(registration.id)
            .await?;
        self.store.delete_registration(registration.id).await?;

        tracing::info!(
            registration_id = %registration.id,
            removed_payments,
            "registration deleted"
        );
        Ok(())
    }
}

/// Strips everything but ASCII digits.
fn digits_of(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Normalizes optional free-text fields: blank becomes absent.
fn none_if_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{EventId, PaymentId};
    use crate::persistence::MemoryStore;
    use crate::persistence::models::{NewAttendance, NewEvent, PaymentRecord};

    fn make_service(store: Arc<MemoryStore>) -> RegistrationService {
        RegistrationService::new(store as Arc<dyn RecordStore>, CheckinFeed::new(100))
    }

    async fn seed_event(store: &MemoryStore, fee: f64) -> crate::persistence::models::EventRecord {
        let Ok(event) = store
            .insert_event(NewEvent {
                name: "Community Physio Day".to_string(),
                description: Some("Postural screening".to_string()),
                location: "Health Center".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
                event_end_date: None,
                total_slots: 10,
                fee,
            })
            .await
        else {
            panic!("event insert failed");
        };
        event
    }

    fn make_intake(event_id: EventId, national_id: &str) -> RegistrationIntake {
        RegistrationIntake {
            event_id,
            full_name: "Maria Silva Santos".to_string(),
            national_id: national_id.to_string(),
            address: "Rua A, 123 - Centro".to_string(),
            phone: "(11) 99999-9999".to_string(),
            injury_notes: Some("knee".to_string()),
            treatment_notes: None,
        }
    }

    #[tokio::test]
    async fn intake_creates_pending_registration_with_code_and_payload() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 50.0).await;
        let service = make_service(Arc::clone(&store));

        let created = service
            .register(make_intake(event.id, "123.456.789-00"))
            .await;
        let Ok(created) = created else {
            panic!("intake failed: {created:?}");
        };

        assert_eq!(created.payment_status, PaymentStatus::Pending);
        assert_eq!(created.national_id, "12345678900");
        assert_eq!(created.phone, "11999999999");
        assert!(!created.validation_code.as_str().is_empty());
        let Some(payload) = &created.qr_payload else {
            panic!("expected a qr payload");
        };
        assert!(payload.contains(created.validation_code.as_str()));
    }

    #[tokio::test]
    async fn second_registration_with_same_national_id_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 0.0).await;
        let service = make_service(Arc::clone(&store));

        let first = service
            .register(make_intake(event.id, "123.456.789-00"))
            .await;
        assert!(first.is_ok());

        let second = service
            .register(make_intake(event.id, "12345678900"))
            .await;
        assert!(matches!(
            second,
            Err(GatewayError::ConstraintViolation(_))
        ));

        let rows = service.list(RegistrationFilter::default()).await;
        assert_eq!(rows.map(|r| r.len()).ok(), Some(1));
    }

    #[tokio::test]
    async fn malformed_fields_are_rejected() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 0.0).await;
        let service = make_service(Arc::clone(&store));

        let mut missing_name = make_intake(event.id, "12345678900");
        missing_name.full_name = "  ".to_string();
        assert!(matches!(
            service.register(missing_name).await,
            Err(GatewayError::InvalidRequest(_))
        ));

        let short_id = make_intake(event.id, "1234567");
        assert!(matches!(
            service.register(short_id).await,
            Err(GatewayError::InvalidRequest(_))
        ));

        let mut short_phone = make_intake(event.id, "12345678900");
        short_phone.phone = "12345".to_string();
        assert!(matches!(
            service.register(short_phone).await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn inactive_or_unknown_event_blocks_intake() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 0.0).await;
        let service = make_service(Arc::clone(&store));

        let unknown = service
            .register(make_intake(EventId::new(), "12345678900"))
            .await;
        assert!(matches!(unknown, Err(GatewayError::EventNotFound(_))));

        let _ = store
            .update_event_status(event.id, EventStatus::Inactive)
            .await;
        let closed = service
            .register(make_intake(event.id, "12345678900"))
            .await;
        assert!(matches!(closed, Err(GatewayError::StateConflict(_))));
    }

    #[tokio::test]
    async fn transition_to_paid_stamps_amount_and_date() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 50.0).await;
        let service = make_service(Arc::clone(&store));

        let Ok(created) = service
            .register(make_intake(event.id, "12345678900"))
            .await
        else {
            panic!("intake failed");
        };
        assert!(created.payment_date.is_none());

        let updated = service
            .set_payment_status(
                created.id,
                PaymentTransition {
                    status: PaymentStatus::Paid,
                    paid_amount: Some(50.0),
                },
            )
            .await;
        let Ok(updated) = updated else {
            panic!("transition failed");
        };
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        assert_eq!(updated.paid_amount, Some(50.0));
        assert!(updated.payment_date.is_some());
    }

    #[tokio::test]
    async fn cancelling_does_not_stamp_payment_fields() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 50.0).await;
        let service = make_service(Arc::clone(&store));

        let Ok(created) = service
            .register(make_intake(event.id, "12345678900"))
            .await
        else {
            panic!("intake failed");
        };

        let updated = service
            .set_payment_status(
                created.id,
                PaymentTransition {
                    status: PaymentStatus::Cancelled,
                    paid_amount: None,
                },
            )
            .await;
        let Ok(updated) = updated else {
            panic!("transition failed");
        };
        assert_eq!(updated.payment_status, PaymentStatus::Cancelled);
        assert!(updated.paid_amount.is_none());
        assert!(updated.payment_date.is_none());
    }

    #[tokio::test]
    async fn delete_is_blocked_by_recorded_attendance() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 0.0).await;
        let service = make_service(Arc::clone(&store));

        let Ok(created) = service
            .register(make_intake(event.id, "12345678900"))
            .await
        else {
            panic!("intake failed");
        };

        // A payment row that must survive the rejected delete.
        let now = Utc::now();
        store
            .seed_payment(PaymentRecord {
                id: PaymentId::new(),
                registration_id: created.id,
                provider_payment_id: Some("prov-1".to_string()),
                amount: 50.0,
                due_date: None,
                paid_date: None,
                status: "pending".to_string(),
                method: None,
                provider_payload: None,
                created_at: now,
                updated_at: now,
            })
            .await;

        let Ok(Some(_)) = store
            .insert_attendance(NewAttendance {
                registration_id: created.id,
                validation_code: created.validation_code.as_str().to_string(),
                validated_by: "front-desk".to_string(),
                validating_device: "scanner-1".to_string(),
            })
            .await
        else {
            panic!("attendance insert failed");
        };

        let result = service.delete(created.id).await;
        assert!(matches!(result, Err(GatewayError::StateConflict(_))));

        // Neither the registration nor its payments were touched.
        let still_there = service.get(created.id).await;
        assert!(still_there.is_ok());
        let payments = store.payments_for_registration(created.id).await;
        assert_eq!(payments.map(|p| p.len()).ok(), Some(1));
    }

    #[tokio::test]
    async fn delete_cascades_payments_first() {
        let store = Arc::new(MemoryStore::new());
        let event = seed_event(&store, 0.0).await;
        let service = make_service(Arc::clone(&store));

        let Ok(created) = service
            .register(make_intake(event.id, "12345678900"))
            .await
        else {
            panic!("intake failed");
        };
        let now = Utc::now();
        store
            .seed_payment(PaymentRecord {
                id: PaymentId::new(),
                registration_id: created.id,
                provider_payment_id: None,
                amount: 50.0,
                due_date: None,
                paid_date: None,
                status: "pending".to_string(),
                method: None,
                provider_payload: None,
                created_at: now,
                updated_at: now,
            })
            .await;

        let result = service.delete(created.id).await;
        assert!(result.is_ok());

        let gone = service.get(created.id).await;
        assert!(matches!(gone, Err(GatewayError::RegistrationNotFound(_))));
        let payments = store.payments_for_registration(created.id).await;
        assert_eq!(payments.map(|p| p.len()).ok(), Some(0));
    }
}
