//! Persistence layer: the record-store contract and its backends.
//!
//! Provides the [`RecordStore`] trait for typed access to the four
//! entities (events, registrations, payments, attendances), a PostgreSQL
//! implementation via `sqlx::PgPool`, an in-memory implementation for
//! tests and local development, and the bounded retry policy for
//! transient store failures.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod record_store;
pub mod retry;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use record_store::{EventFilter, RecordStore, RegistrationFilter, StoreError};
pub use retry::{RetryPolicy, with_retry};
