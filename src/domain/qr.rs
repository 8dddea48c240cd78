//! QR payload encoding and decoding.
//!
//! A participant's QR code carries either the bare validation code or a
//! structured JSON payload embedding the code alongside display metadata.
//! Scanners decode whatever they read back to the raw code string before
//! handing it to the validation engine, so the engine never sees payload
//! structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RegistrationId;
use super::code::ValidationCode;

/// Structured QR payload stored in `registrations.qr_payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    /// The validation code the payload resolves to.
    pub code: String,
    /// Participant's full name, for human-readable badge rendering.
    pub full_name: String,
    /// Owning registration.
    pub registration_id: RegistrationId,
    /// When the payload was generated.
    pub generated_at: DateTime<Utc>,
}

impl QrPayload {
    /// Builds a payload for a freshly created registration.
    #[must_use]
    pub fn new(code: &ValidationCode, full_name: &str, registration_id: RegistrationId) -> Self {
        Self {
            code: code.as_str().to_string(),
            full_name: full_name.to_string(),
            registration_id,
            generated_at: Utc::now(),
        }
    }

    /// Serializes the payload to the JSON string embedded in the QR image.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decodes scanner input back to the raw validation code.
///
/// Accepts both payload forms: a plain code string, or a JSON object with
/// a `code` field. Anything that parses as JSON but lacks a string `code`
/// falls back to being treated as a plain code.
#[must_use]
pub fn decode_presented(raw: &str) -> ValidationCode {
    let trimmed = raw.trim();
    if trimmed.starts_with('{')
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed)
        && let Some(code) = value.get("code").and_then(|c| c.as_str())
    {
        return ValidationCode::from_presented(code);
    }
    ValidationCode::from_presented(trimmed)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn plain_code_passes_through() {
        let code = decode_presented("  A1B2C3D4E5F6  ");
        assert_eq!(code.as_str(), "A1B2C3D4E5F6");
    }

    #[test]
    fn structured_payload_yields_embedded_code() {
        let payload = QrPayload::new(
            &ValidationCode::from_presented("DEADBEEF0123"),
            "Maria Silva Santos",
            RegistrationId::new(),
        );
        let Ok(encoded) = payload.encode() else {
            panic!("payload should encode");
        };
        let code = decode_presented(&encoded);
        assert_eq!(code.as_str(), "DEADBEEF0123");
    }

    #[test]
    fn json_without_code_field_is_treated_as_plain() {
        let raw = r#"{"name":"not a payload"}"#;
        let code = decode_presented(raw);
        assert_eq!(code.as_str(), raw);
    }

    #[test]
    fn malformed_json_is_treated_as_plain() {
        let code = decode_presented("{not-json");
        assert_eq!(code.as_str(), "{not-json");
    }
}
