//! Validation engine: decides whether a presented code records attendance.
//!
//! The rule is "paid registrations only, attendance recorded at most
//! once". Classification runs as sequential reads (code lookup, payment
//! check, prior-attendance check); the write is a single insert-if-absent
//! backed by the store's unique constraint on the registration id, so two
//! operators scanning the same code concurrently can never produce two
//! attendance rows. The loser is reported the winner's timestamp.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{CheckinEvent, CheckinFeed, ValidationOutcome, qr};
use crate::error::GatewayError;
use crate::persistence::models::NewAttendance;
use crate::persistence::{RecordStore, RetryPolicy, with_retry};

/// One validation attempt as received from a scanning client.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// Raw scanner input: a bare code or a structured QR payload. The
    /// engine does not care whether it came from a camera or a keyboard.
    pub presented: String,
    /// Operator identity recorded on the attendance row.
    pub validated_by: String,
    /// Device label recorded on the attendance row.
    pub validating_device: String,
}

/// Orchestrates the check-in validation workflow.
#[derive(Debug)]
pub struct ValidationService {
    store: Arc<dyn RecordStore>,
    feed: CheckinFeed,
    retry: RetryPolicy,
}

impl ValidationService {
    /// Creates a new `ValidationService`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, feed: CheckinFeed, retry: RetryPolicy) -> Self {
        Self { store, feed, retry }
    }

    /// Validates a presented code, recording attendance when allowed.
    ///
    /// Outcomes other than [`ValidationOutcome::Validated`] perform no
    /// write. Transport failures surface as errors; re-invoking with the
    /// same code is safe at any point.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an empty code and
    /// [`GatewayError::Store`] when the store keeps failing after the
    /// retry budget.
    pub async fn validate(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationOutcome, GatewayError> {
        let code = qr::decode_presented(&request.presented);
        if code.as_str().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "validation code is required".to_string(),
            ));
        }

        let registration =
            with_retry(&self.retry, || self.store.registration_by_code(&code)).await?;
        let Some(registration) = registration else {
            tracing::debug!(code = %code, "validation code not found");
            return Ok(ValidationOutcome::NotFound);
        };

        if registration.payment_status != crate::domain::PaymentStatus::Paid {
            tracing::debug!(
                registration_id = %registration.id,
                status = %registration.payment_status,
                "payment not confirmed"
            );
            return Ok(ValidationOutcome::PaymentRequired {
                full_name: registration.full_name,
            });
        }

        let existing = with_retry(&self.retry, || {
            self.store.attendance_for_registration(registration.id)
        })
        .await?;
        if let Some(attendance) = existing {
            return Ok(ValidationOutcome::AlreadyValidated {
                full_name: registration.full_name,
                validated_at: attendance.validated_at,
            });
        }

        let inserted = with_retry(&self.retry, || {
            self.store.insert_attendance(NewAttendance {
                registration_id: registration.id,
                validation_code: code.as_str().to_string(),
                validated_by: request.validated_by.clone(),
                validating_device: request.validating_device.clone(),
            })
        })
        .await?;

        match inserted {
            Some(attendance) => {
                tracing::info!(
                    registration_id = %registration.id,
                    validated_by = %attendance.validated_by,
                    "attendance recorded"
                );
                let _ = self.feed.publish(CheckinEvent::AttendanceRecorded {
                    event_id: registration.event_id,
                    registration_id: registration.id,
                    full_name: registration.full_name.clone(),
                    validated_by: attendance.validated_by.clone(),
                    timestamp: Utc::now(),
                });
                Ok(ValidationOutcome::Validated {
                    full_name: registration.full_name,
                    validated_at: attendance.validated_at,
                })
            }
            None => {
                // Lost an insert race: a concurrent scan recorded the row
                // between our check and our write. Report its timestamp.
                let winner = with_retry(&self.retry, || {
                    self.store.attendance_for_registration(registration.id)
                })
                .await?;
                match winner {
                    Some(attendance) => Ok(ValidationOutcome::AlreadyValidated {
                        full_name: registration.full_name,
                        validated_at: attendance.validated_at,
                    }),
                    None => Err(GatewayError::Internal(
                        "attendance insert conflicted but no row exists".to_string(),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{
        EventId, EventStatus, PaymentStatus, QrPayload, RegistrationId, ValidationCode,
    };
    use crate::persistence::MemoryStore;
    use crate::persistence::models::{
        AttendanceRecord, EventRecord, EventUpdate, NewEvent, NewRegistrationRecord,
        PaymentRecord, PaymentUpdate, RegistrationRecord, RegistrationTotals,
    };
    use crate::persistence::record_store::{EventFilter, RegistrationFilter, StoreError};

    fn make_service(store: Arc<dyn RecordStore>) -> ValidationService {
        ValidationService::new(store, CheckinFeed::new(100), RetryPolicy::none())
    }

    fn make_request(presented: &str) -> ValidationRequest {
        ValidationRequest {
            presented: presented.to_string(),
            validated_by: "front-desk".to_string(),
            validating_device: "scanner-1".to_string(),
        }
    }

    async fn seed_registration(store: &MemoryStore, paid: bool) -> RegistrationRecord {
        let Ok(event) = store
            .insert_event(NewEvent {
                name: "Community Physio Day".to_string(),
                description: None,
                location: "Health Center".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
                event_end_date: None,
                total_slots: 10,
                fee: 0.0,
            })
            .await
        else {
            panic!("event insert failed");
        };

        let Ok(registration) = store
            .insert_registration(NewRegistrationRecord {
                id: RegistrationId::new(),
                event_id: event.id,
                full_name: "Maria Silva Santos".to_string(),
                national_id: "12345678900".to_string(),
                address: "Rua A, 123".to_string(),
                phone: "11999999999".to_string(),
                injury_notes: None,
                treatment_notes: None,
                validation_code: ValidationCode::generate(),
                qr_payload: None,
            })
            .await
        else {
            panic!("registration insert failed");
        };

        if paid {
            let Ok(updated) = store
                .update_registration_payment(
                    registration.id,
                    PaymentUpdate {
                        status: PaymentStatus::Paid,
                        paid_amount: Some(0.0),
                        payment_date: Some(Utc::now()),
                    },
                )
                .await
            else {
                panic!("payment update failed");
            };
            return updated;
        }
        registration
    }

    #[tokio::test]
    async fn unknown_code_is_not_found_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store) as Arc<dyn RecordStore>);

        let outcome = service.validate(make_request("NO-SUCH-CODE")).await;
        assert_eq!(outcome.ok(), Some(ValidationOutcome::NotFound));

        let count = store.attendance_count(None).await;
        assert_eq!(count.ok(), Some(0));
    }

    #[tokio::test]
    async fn empty_code_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(store);

        let outcome = service.validate(make_request("   ")).await;
        assert!(matches!(outcome, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn pending_payment_blocks_validation_without_write() {
        let store = Arc::new(MemoryStore::new());
        let registration = seed_registration(&store, false).await;
        let service = make_service(Arc::clone(&store) as Arc<dyn RecordStore>);

        let outcome = service
            .validate(make_request(registration.validation_code.as_str()))
            .await;
        let Ok(ValidationOutcome::PaymentRequired { full_name }) = outcome else {
            panic!("expected PaymentRequired");
        };
        assert_eq!(full_name, "Maria Silva Santos");

        let count = store.attendance_count(None).await;
        assert_eq!(count.ok(), Some(0));
    }

    #[tokio::test]
    async fn paid_registration_validates_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let registration = seed_registration(&store, true).await;
        let service = make_service(Arc::clone(&store) as Arc<dyn RecordStore>);

        let first = service
            .validate(make_request(registration.validation_code.as_str()))
            .await;
        let Ok(ValidationOutcome::Validated { full_name, .. }) = first else {
            panic!("expected Validated");
        };
        assert_eq!(full_name, "Maria Silva Santos");

        let count = store.attendance_count(None).await;
        assert_eq!(count.ok(), Some(1));
    }

    #[tokio::test]
    async fn sequential_retry_reports_already_validated_with_one_row() {
        let store = Arc::new(MemoryStore::new());
        let registration = seed_registration(&store, true).await;
        let service = make_service(Arc::clone(&store) as Arc<dyn RecordStore>);

        let first = service
            .validate(make_request(registration.validation_code.as_str()))
            .await;
        let Ok(ValidationOutcome::Validated { validated_at, .. }) = first else {
            panic!("expected Validated");
        };

        let second = service
            .validate(make_request(registration.validation_code.as_str()))
            .await;
        let Ok(ValidationOutcome::AlreadyValidated {
            validated_at: earlier,
            ..
        }) = second
        else {
            panic!("expected AlreadyValidated");
        };
        assert_eq!(earlier, validated_at);

        let count = store.attendance_count(None).await;
        assert_eq!(count.ok(), Some(1));
    }

    #[tokio::test]
    async fn structured_payload_resolves_to_embedded_code() {
        let store = Arc::new(MemoryStore::new());
        let registration = seed_registration(&store, true).await;
        let service = make_service(Arc::clone(&store) as Arc<dyn RecordStore>);

        let payload = QrPayload::new(
            &registration.validation_code,
            &registration.full_name,
            registration.id,
        );
        let Ok(encoded) = payload.encode() else {
            panic!("payload should encode");
        };

        let outcome = service.validate(make_request(&encoded)).await;
        assert!(matches!(outcome, Ok(ValidationOutcome::Validated { .. })));
    }

    #[tokio::test]
    async fn validated_attempt_publishes_feed_event() {
        let store = Arc::new(MemoryStore::new());
        let registration = seed_registration(&store, true).await;
        let feed = CheckinFeed::new(100);
        let mut rx = feed.subscribe();
        let service = ValidationService::new(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            feed,
            RetryPolicy::none(),
        );

        let _ = service
            .validate(make_request(registration.validation_code.as_str()))
            .await;

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected feed event");
        };
        assert_eq!(event.event_type_str(), "attendance_recorded");
    }

    #[tokio::test]
    async fn full_flow_from_intake_to_validated_entry() {
        use crate::service::{PaymentTransition, RegistrationIntake, RegistrationService};

        let store = Arc::new(MemoryStore::new());
        let Ok(event) = store
            .insert_event(NewEvent {
                name: "Free Community Day".to_string(),
                description: None,
                location: "Health Center".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
                event_end_date: None,
                total_slots: 10,
                fee: 0.0,
            })
            .await
        else {
            panic!("event insert failed");
        };

        let registrations = RegistrationService::new(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            CheckinFeed::new(100),
        );
        let Ok(created) = registrations
            .register(RegistrationIntake {
                event_id: event.id,
                full_name: "Ana Paula Costa".to_string(),
                national_id: "456.789.123-00".to_string(),
                address: "Av. B, 45".to_string(),
                phone: "(11) 77777-7777".to_string(),
                injury_notes: None,
                treatment_notes: None,
            })
            .await
        else {
            panic!("intake failed");
        };
        assert_eq!(created.payment_status, PaymentStatus::Pending);

        let Ok(_) = registrations
            .set_payment_status(
                created.id,
                PaymentTransition {
                    status: PaymentStatus::Paid,
                    paid_amount: None,
                },
            )
            .await
        else {
            panic!("transition failed");
        };

        let service = make_service(Arc::clone(&store) as Arc<dyn RecordStore>);
        let outcome = service
            .validate(make_request(created.validation_code.as_str()))
            .await;
        let Ok(ValidationOutcome::Validated { full_name, .. }) = outcome else {
            panic!("expected Validated, got {outcome:?}");
        };
        assert_eq!(full_name, "Ana Paula Costa");
    }

    #[tokio::test]
    async fn untransitioned_intake_is_reported_payment_required() {
        use crate::service::{RegistrationIntake, RegistrationService};

        let store = Arc::new(MemoryStore::new());
        let Ok(event) = store
            .insert_event(NewEvent {
                name: "Community Physio Day".to_string(),
                description: None,
                location: "Health Center".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
                event_end_date: None,
                total_slots: 10,
                fee: 50.0,
            })
            .await
        else {
            panic!("event insert failed");
        };

        let registrations = RegistrationService::new(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            CheckinFeed::new(100),
        );
        let Ok(created) = registrations
            .register(RegistrationIntake {
                event_id: event.id,
                full_name: "João Carlos Oliveira".to_string(),
                national_id: "987.654.321-00".to_string(),
                address: "Rua C, 9".to_string(),
                phone: "(11) 88888-8888".to_string(),
                injury_notes: None,
                treatment_notes: None,
            })
            .await
        else {
            panic!("intake failed");
        };

        let service = make_service(Arc::clone(&store) as Arc<dyn RecordStore>);
        let outcome = service
            .validate(make_request(created.validation_code.as_str()))
            .await;
        let Ok(ValidationOutcome::PaymentRequired { full_name }) = outcome else {
            panic!("expected PaymentRequired, got {outcome:?}");
        };
        assert_eq!(full_name, "João Carlos Oliveira");
    }

    /// Store double simulating the insert race: the prior-attendance
    /// pre-check sees nothing, but the insert still hits the unique
    /// constraint. Later reads delegate so the engine can recover the
    /// winning row.
    #[derive(Debug)]
    struct RacingStore {
        inner: MemoryStore,
        pre_check_done: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl RecordStore for RacingStore {
        async fn insert_event(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
            self.inner.insert_event(event).await
        }
        async fn event(&self, id: EventId) -> Result<Option<EventRecord>, StoreError> {
            self.inner.event(id).await
        }
        async fn list_events(&self, filter: EventFilter) -> Result<Vec<EventRecord>, StoreError> {
            self.inner.list_events(filter).await
        }
        async fn update_event(
            &self,
            id: EventId,
            update: EventUpdate,
        ) -> Result<EventRecord, StoreError> {
            self.inner.update_event(id, update).await
        }
        async fn update_event_status(
            &self,
            id: EventId,
            status: EventStatus,
        ) -> Result<EventRecord, StoreError> {
            self.inner.update_event_status(id, status).await
        }
        async fn delete_event(&self, id: EventId) -> Result<(), StoreError> {
            self.inner.delete_event(id).await
        }
        async fn insert_registration(
            &self,
            registration: NewRegistrationRecord,
        ) -> Result<RegistrationRecord, StoreError> {
            self.inner.insert_registration(registration).await
        }
        async fn registration(
            &self,
            id: RegistrationId,
        ) -> Result<Option<RegistrationRecord>, StoreError> {
            self.inner.registration(id).await
        }
        async fn registration_by_code(
            &self,
            code: &ValidationCode,
        ) -> Result<Option<RegistrationRecord>, StoreError> {
            self.inner.registration_by_code(code).await
        }
        async fn list_registrations(
            &self,
            filter: RegistrationFilter,
        ) -> Result<Vec<RegistrationRecord>, StoreError> {
            self.inner.list_registrations(filter).await
        }
        async fn update_registration_payment(
            &self,
            id: RegistrationId,
            update: PaymentUpdate,
        ) -> Result<RegistrationRecord, StoreError> {
            self.inner.update_registration_payment(id, update).await
        }
        async fn delete_registration(&self, id: RegistrationId) -> Result<(), StoreError> {
            self.inner.delete_registration(id).await
        }
        async fn registration_totals(
            &self,
            event_id: Option<EventId>,
        ) -> Result<RegistrationTotals, StoreError> {
            self.inner.registration_totals(event_id).await
        }
        async fn payments_for_registration(
            &self,
            id: RegistrationId,
        ) -> Result<Vec<PaymentRecord>, StoreError> {
            self.inner.payments_for_registration(id).await
        }
        async fn delete_payments_for_registration(
            &self,
            id: RegistrationId,
        ) -> Result<u64, StoreError> {
            self.inner.delete_payments_for_registration(id).await
        }
        async fn attendance_for_registration(
            &self,
            id: RegistrationId,
        ) -> Result<Option<AttendanceRecord>, StoreError> {
            // The first check reports "no attendance yet", forcing the
            // engine down the insert path even though a row exists.
            if !self
                .pre_check_done
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                return Ok(None);
            }
            self.inner.attendance_for_registration(id).await
        }
        async fn insert_attendance(
            &self,
            attendance: NewAttendance,
        ) -> Result<Option<AttendanceRecord>, StoreError> {
            self.inner.insert_attendance(attendance).await
        }
        async fn attendance_count(&self, event_id: Option<EventId>) -> Result<u64, StoreError> {
            self.inner.attendance_count(event_id).await
        }
    }

    #[tokio::test]
    async fn losing_the_insert_race_reports_already_validated() {
        let inner = MemoryStore::new();
        let registration = seed_registration(&inner, true).await;

        // The winner's row already exists in the underlying tables.
        let Ok(Some(winner)) = inner
            .insert_attendance(NewAttendance {
                registration_id: registration.id,
                validation_code: registration.validation_code.as_str().to_string(),
                validated_by: "front-desk".to_string(),
                validating_device: "scanner-2".to_string(),
            })
            .await
        else {
            panic!("winner insert failed");
        };

        let racing = Arc::new(RacingStore {
            inner,
            pre_check_done: std::sync::atomic::AtomicBool::new(false),
        });
        let service = make_service(racing);

        let outcome = service
            .validate(make_request(registration.validation_code.as_str()))
            .await;
        // RacingStore hides the existing row from the pre-check, so the
        // engine attempts the insert, loses on the constraint, and falls
        // back to the inner store's row via insert_attendance's None.
        let Ok(ValidationOutcome::AlreadyValidated { validated_at, .. }) = outcome else {
            panic!("expected AlreadyValidated after losing the race, got {outcome:?}");
        };
        assert_eq!(validated_at, winner.validated_at);
    }
}
