//! Financial and attendance summaries.
//!
//! Counters are recomputed from the store on every read. Nothing here
//! increments anything; drifting cached tallies cannot exist.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::EventId;
use crate::error::GatewayError;
use crate::persistence::models::RegistrationTotals;
use crate::persistence::{RecordStore, RetryPolicy, with_retry};

/// Aggregate view served to the dashboard.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Summary {
    /// Registration counters and revenue.
    pub registrations: RegistrationTotals,
    /// Attendance rows recorded so far.
    pub attendance_count: u64,
}

/// Computes dashboard summaries.
#[derive(Debug)]
pub struct ReportService {
    store: Arc<dyn RecordStore>,
    retry: RetryPolicy,
}

impl ReportService {
    /// Creates a new `ReportService`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Summary across all events.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] on store failure.
    pub async fn global_summary(&self) -> Result<Summary, GatewayError> {
        self.summary(None).await
    }

    /// Summary scoped to one event.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] when the event is unknown.
    pub async fn event_summary(&self, event_id: EventId) -> Result<Summary, GatewayError> {
        if self.store.event(event_id).await?.is_none() {
            return Err(GatewayError::EventNotFound(*event_id.as_uuid()));
        }
        self.summary(Some(event_id)).await
    }

    async fn summary(&self, event_id: Option<EventId>) -> Result<Summary, GatewayError> {
        let registrations =
            with_retry(&self.retry, || self.store.registration_totals(event_id)).await?;
        let attendance_count =
            with_retry(&self.retry, || self.store.attendance_count(event_id)).await?;
        Ok(Summary {
            registrations,
            attendance_count,
        })
    }
}
