//! Result of one validation attempt.

use chrono::{DateTime, Utc};

/// Outcome of presenting a code to the validation engine.
///
/// Only [`ValidationOutcome::Validated`] has a side effect (exactly one
/// attendance insert); every other outcome leaves the store untouched.
/// Transport and database failures are not outcomes; they surface as
/// errors from the engine so the operator retries the same code.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// No registration carries the presented code.
    NotFound,
    /// The registration exists but its payment is not confirmed.
    PaymentRequired {
        /// Participant's name, shown to the operator.
        full_name: String,
    },
    /// Attendance was already recorded for this registration.
    AlreadyValidated {
        /// Participant's name.
        full_name: String,
        /// When the earlier validation happened.
        validated_at: DateTime<Utc>,
    },
    /// Attendance has been recorded now.
    Validated {
        /// Participant's name.
        full_name: String,
        /// Timestamp of the new attendance record.
        validated_at: DateTime<Utc>,
    },
}

impl ValidationOutcome {
    /// Returns `true` for the single outcome that recorded attendance.
    #[must_use]
    pub const fn is_validated(&self) -> bool {
        matches!(self, Self::Validated { .. })
    }

    /// Short discriminator string used in logs and API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PaymentRequired { .. } => "payment_required",
            Self::AlreadyValidated { .. } => "already_validated",
            Self::Validated { .. } => "validated",
        }
    }
}
