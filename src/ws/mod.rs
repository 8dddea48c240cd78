//! WebSocket layer: the live check-in feed.
//!
//! The WebSocket endpoint at `/ws` streams check-in events (registration
//! created, payment confirmed, attendance recorded, event status changed)
//! filtered by per-connection event subscriptions.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
