//! # checkin-gateway
//!
//! REST API and WebSocket gateway for event registration and on-site
//! check-in validation.
//!
//! This crate is the service boundary in front of the PostgreSQL record
//! store: the public intake flow, the administrative operations, and the
//! check-in validation engine all run server-side, with the database
//! enforcing the write-time invariants (one registration per national id
//! per event, one attendance per registration).
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Services (service/)
//!     ├── CheckinFeed (domain/)
//!     │
//!     └── PostgreSQL Record Store (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
