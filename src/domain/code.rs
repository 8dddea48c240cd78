//! Validation code generation.
//!
//! Every registration is issued one unique code, printed under its QR code
//! and rendered as a Code 39 barcode, so the alphabet is restricted to
//! uppercase hexadecimal digits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of characters in a validation code.
const CODE_LEN: usize = 12;

/// A registration's unique validation code.
///
/// Presented at the event entrance (scanned or typed) to prove identity
/// and payment. Uniqueness is enforced by the store's constraint on
/// `registrations.validation_code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationCode(String);

impl ValidationCode {
    /// Generates a fresh code from a random UUID.
    ///
    /// Twelve uppercase hex characters give 48 bits of entropy, far more
    /// than one event's worth of registrations can collide on, and the
    /// store constraint catches the astronomically unlikely duplicate.
    #[must_use]
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        Self(hex.chars().take(CODE_LEN).collect())
    }

    /// Wraps an already-issued code, trimming surrounding whitespace.
    #[must_use]
    pub fn from_presented(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ValidationCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}
