//! Type-safe entity identifiers.
//!
//! Each persisted entity gets its own newtype wrapper around
//! [`uuid::Uuid`] (v4) so that, for example, a registration id cannot be
//! passed where an event id is expected.

use std::fmt;

/// Defines a UUID-v4 newtype identifier for one entity.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "` (UUID v4).")]
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            #[doc = concat!("Creates a `", stringify!($name), "` from an existing [`uuid::Uuid`].")]
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id! {
    /// Unique identifier for an event.
    ///
    /// Generated at event creation and immutable thereafter. Used as the
    /// foreign key on registrations and as the WebSocket subscription
    /// target for the live check-in feed.
    EventId
}

entity_id! {
    /// Unique identifier for a registration.
    RegistrationId
}

entity_id! {
    /// Unique identifier for a payment row.
    PaymentId
}

entity_id! {
    /// Unique identifier for an attendance record.
    AttendanceId
}
