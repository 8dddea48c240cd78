//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::CheckinFeed;
use crate::service::{
    EventService, ExportService, RegistrationService, ReportService, ValidationService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event management.
    pub events: Arc<EventService>,
    /// Registration intake and administration.
    pub registrations: Arc<RegistrationService>,
    /// Check-in validation engine.
    pub validation: Arc<ValidationService>,
    /// CSV exports.
    pub export: Arc<ExportService>,
    /// Dashboard summaries.
    pub reports: Arc<ReportService>,
    /// Live check-in feed for WebSocket subscriptions.
    pub feed: CheckinFeed,
}
