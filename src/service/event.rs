//! Event management: create, edit, activate/deactivate, delete.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{CheckinEvent, CheckinFeed, EventId, EventStatus};
use crate::error::GatewayError;
use crate::persistence::models::{EventRecord, EventUpdate, NewEvent};
use crate::persistence::{EventFilter, RecordStore};

/// Event lifecycle operations.
#[derive(Debug)]
pub struct EventService {
    store: Arc<dyn RecordStore>,
    feed: CheckinFeed,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, feed: CheckinFeed) -> Self {
        Self { store, feed }
    }

    /// Creates an event in `active` status.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] on malformed fields.
    pub async fn create(&self, event: NewEvent) -> Result<EventRecord, GatewayError> {
        check_event_fields(
            &event.name,
            &event.location,
            event.total_slots,
            event.fee,
            event.event_date,
            event.event_end_date,
        )?;

        let created = self.store.insert_event(event).await?;
        tracing::info!(event_id = %created.id, name = %created.name, "event created");
        Ok(created)
    }

    /// Fetches an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] when no row matches.
    pub async fn get(&self, id: EventId) -> Result<EventRecord, GatewayError> {
        self.store
            .event(id)
            .await?
            .ok_or(GatewayError::EventNotFound(*id.as_uuid()))
    }

    /// Lists events, newest event date first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] on store failure.
    pub async fn list(&self, filter: EventFilter) -> Result<Vec<EventRecord>, GatewayError> {
        Ok(self.store.list_events(filter).await?)
    }

    /// Replaces an event's editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] when no row matches and
    /// [`GatewayError::InvalidRequest`] on malformed fields.
    pub async fn update(
        &self,
        id: EventId,
        update: EventUpdate,
    ) -> Result<EventRecord, GatewayError> {
        check_event_fields(
            &update.name,
            &update.location,
            update.total_slots,
            update.fee,
            update.event_date,
            update.event_end_date,
        )?;

        let updated = self
            .store
            .update_event(id, update)
            .await
            .map_err(|err| match err {
                crate::persistence::StoreError::NotFound => {
                    GatewayError::EventNotFound(*id.as_uuid())
                }
                other => GatewayError::Store(other),
            })?;
        tracing::info!(event_id = %updated.id, "event updated");
        Ok(updated)
    }

    /// Sets an event's status, publishing the change on the feed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] when no row matches.
    pub async fn set_status(
        &self,
        id: EventId,
        status: EventStatus,
    ) -> Result<EventRecord, GatewayError> {
        let updated = self
            .store
            .update_event_status(id, status)
            .await
            .map_err(|err| match err {
                crate::persistence::StoreError::NotFound => {
                    GatewayError::EventNotFound(*id.as_uuid())
                }
                other => GatewayError::Store(other),
            })?;

        tracing::info!(event_id = %updated.id, status = %updated.status, "event status changed");
        let _ = self.feed.publish(CheckinEvent::EventStatusChanged {
            event_id: updated.id,
            status: updated.status,
            timestamp: Utc::now(),
        });
        Ok(updated)
    }

    /// Deletes an event. Rejected while its occupancy counter is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] when no row matches and
    /// [`GatewayError::StateConflict`] when occupied slots remain.
    pub async fn delete(&self, id: EventId) -> Result<(), GatewayError> {
        let event = self.get(id).await?;

        if event.occupied_slots > 0 {
            return Err(GatewayError::StateConflict(
                "event has linked registrations and cannot be deleted".to_string(),
            ));
        }

        self.store.delete_event(event.id).await?;
        tracing::info!(event_id = %event.id, "event deleted");
        Ok(())
    }
}

/// Field checks shared by create and update.
fn check_event_fields(
    name: &str,
    location: &str,
    total_slots: i32,
    fee: f64,
    event_date: chrono::NaiveDate,
    event_end_date: Option<chrono::NaiveDate>,
) -> Result<(), GatewayError> {
    if name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "event name is required".to_string(),
        ));
    }
    if location.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "event location is required".to_string(),
        ));
    }
    if total_slots <= 0 {
        return Err(GatewayError::InvalidRequest(
            "total slots must be positive".to_string(),
        ));
    }
    if !fee.is_finite() || fee < 0.0 {
        return Err(GatewayError::InvalidRequest(
            "fee must be zero or positive".to_string(),
        ));
    }
    if let Some(end) = event_end_date
        && end < event_date
    {
        return Err(GatewayError::InvalidRequest(
            "event end date cannot precede the start date".to_string(),
        ));
    }
    Ok(())
}
