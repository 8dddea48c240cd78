//! REST endpoint handlers organized by resource.

pub mod event;
pub mod registration;
pub mod report;
pub mod system;
pub mod validation;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(event::routes())
        .merge(registration::routes())
        .merge(validation::routes())
        .merge(report::routes())
}
