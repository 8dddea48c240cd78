//! Validation endpoint DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ValidationOutcome;
use crate::service::ValidationRequest;

/// Request body for `POST /validations`.
///
/// `code` carries whatever the scanning client read: a bare validation
/// code typed by an operator, or the full QR payload from a camera scan.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidateCodeRequest {
    /// Scanned or typed code/payload.
    pub code: String,
    /// Operator identity recorded on the attendance row.
    #[serde(default = "default_validated_by")]
    pub validated_by: String,
    /// Device label recorded on the attendance row.
    #[serde(default = "default_device")]
    pub validating_device: String,
}

fn default_validated_by() -> String {
    "admin".to_string()
}

fn default_device() -> String {
    "web-admin".to_string()
}

impl From<ValidateCodeRequest> for ValidationRequest {
    fn from(req: ValidateCodeRequest) -> Self {
        Self {
            presented: req.code,
            validated_by: req.validated_by,
            validating_device: req.validating_device,
        }
    }
}

/// Response body for `POST /validations`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationResponse {
    /// Outcome discriminator: `validated`, `already_validated`,
    /// `payment_required`, or `not_found`.
    pub status: String,
    /// Operator-facing message.
    pub message: String,
    /// Participant's name, when the code resolved to a registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    /// Timestamp of the (new or prior) validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
}

impl From<ValidationOutcome> for ValidationResponse {
    fn from(outcome: ValidationOutcome) -> Self {
        let status = outcome.as_str().to_string();
        match outcome {
            ValidationOutcome::NotFound => Self {
                status,
                message: "validation code not found".to_string(),
                participant_name: None,
                validated_at: None,
            },
            ValidationOutcome::PaymentRequired { full_name } => Self {
                status,
                message: "payment not confirmed".to_string(),
                participant_name: Some(full_name),
                validated_at: None,
            },
            ValidationOutcome::AlreadyValidated {
                full_name,
                validated_at,
            } => Self {
                status,
                message: "attendance already confirmed".to_string(),
                participant_name: Some(full_name),
                validated_at: Some(validated_at),
            },
            ValidationOutcome::Validated {
                full_name,
                validated_at,
            } => Self {
                status,
                message: "attendance confirmed".to_string(),
                participant_name: Some(full_name),
                validated_at: Some(validated_at),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn validated_outcome_carries_name_and_time() {
        let now = Utc::now();
        let response = ValidationResponse::from(ValidationOutcome::Validated {
            full_name: "Maria Silva Santos".to_string(),
            validated_at: now,
        });
        assert_eq!(response.status, "validated");
        assert_eq!(
            response.participant_name.as_deref(),
            Some("Maria Silva Santos")
        );
        assert_eq!(response.validated_at, Some(now));
    }

    #[test]
    fn not_found_has_no_participant() {
        let response = ValidationResponse::from(ValidationOutcome::NotFound);
        assert_eq!(response.status, "not_found");
        assert!(response.participant_name.is_none());
        assert!(response.validated_at.is_none());
    }

    #[test]
    fn request_defaults_fill_operator_fields() {
        let parsed: Result<ValidateCodeRequest, _> =
            serde_json::from_str(r#"{"code":"A1B2C3D4E5F6"}"#);
        let Ok(request) = parsed else {
            panic!("request should deserialize");
        };
        assert_eq!(request.validated_by, "admin");
        assert_eq!(request.validating_device, "web-admin");
    }
}
