//! CSV export of filtered registration sets.
//!
//! Output format: UTF-8, a header row of human-readable labels, and
//! double-quote wrapping (with internal quotes doubled) for any value
//! containing a comma, quote, or line break. An export that matches zero
//! rows produces no file.

use std::sync::Arc;

use chrono::Utc;

use crate::error::GatewayError;
use crate::persistence::models::RegistrationRecord;
use crate::persistence::{RecordStore, RegistrationFilter, RetryPolicy, with_retry};

/// Column labels for the header row.
const HEADERS: [&str; 9] = [
    "Full Name",
    "National ID",
    "Phone",
    "Address",
    "Payment Status",
    "Paid Amount",
    "Registration Date",
    "Payment Date",
    "Validation Code",
];

/// A produced export file.
#[derive(Debug, Clone)]
pub struct CsvExport {
    /// Suggested download filename.
    pub filename: String,
    /// UTF-8 CSV content.
    pub content: String,
}

/// Builds registration exports.
#[derive(Debug)]
pub struct ExportService {
    store: Arc<dyn RecordStore>,
    retry: RetryPolicy,
}

impl ExportService {
    /// Creates a new `ExportService`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Exports registrations matching the filter as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EmptyExport`] when no rows match, so the
    /// caller reports "no data" instead of serving an empty file.
    pub async fn export_registrations(
        &self,
        filter: RegistrationFilter,
    ) -> Result<CsvExport, GatewayError> {
        let rows = with_retry(&self.retry, || {
            self.store.list_registrations(filter.clone())
        })
        .await?;

        if rows.is_empty() {
            return Err(GatewayError::EmptyExport);
        }

        let mut content = String::new();
        content.push_str(&csv_line(HEADERS.iter().map(|h| (*h).to_string())));
        for row in &rows {
            content.push_str(&csv_line(row_fields(row)));
        }

        let filename = format!("registrations-{}.csv", Utc::now().format("%Y%m%d"));
        tracing::info!(rows = rows.len(), filename = %filename, "export produced");
        Ok(CsvExport { filename, content })
    }
}

/// Flattens one registration into export column values.
fn row_fields(row: &RegistrationRecord) -> impl Iterator<Item = String> {
    [
        row.full_name.clone(),
        row.national_id.clone(),
        row.phone.clone(),
        row.address.clone(),
        row.payment_status.to_string(),
        row.paid_amount.map(|v| format!("{v:.2}")).unwrap_or_default(),
        row.registration_date.to_rfc3339(),
        row.payment_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
        row.validation_code.as_str().to_string(),
    ]
    .into_iter()
}

/// Joins escaped fields into one terminated CSV line.
fn csv_line(fields: impl Iterator<Item = String>) -> String {
    let mut line = fields.map(|f| csv_field(&f)).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

/// Escapes one CSV value: wrap in double quotes when it contains a comma,
/// quote, or line break; double any internal quotes.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{PaymentStatus, RegistrationId, ValidationCode};
    use crate::persistence::MemoryStore;
    use crate::persistence::models::{NewEvent, NewRegistrationRecord, PaymentUpdate};

    #[test]
    fn plain_value_is_unquoted() {
        assert_eq!(csv_field("Maria Silva"), "Maria Silva");
    }

    #[test]
    fn comma_value_is_quoted() {
        assert_eq!(csv_field("Rua A, 123"), "\"Rua A, 123\"");
    }

    #[test]
    fn internal_quotes_are_doubled() {
        assert_eq!(csv_field("the \"annex\" hall"), "\"the \"\"annex\"\" hall\"");
    }

    #[test]
    fn newline_value_is_quoted() {
        assert_eq!(csv_field("line1\nline2"), "\"line1\nline2\"");
    }

    async fn seed_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let Ok(event) = store
            .insert_event(NewEvent {
                name: "Community Physio Day".to_string(),
                description: None,
                location: "Health Center".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
                event_end_date: None,
                total_slots: 10,
                fee: 50.0,
            })
            .await
        else {
            panic!("event insert failed");
        };

        let Ok(registration) = store
            .insert_registration(NewRegistrationRecord {
                id: RegistrationId::new(),
                event_id: event.id,
                full_name: "Maria Silva Santos".to_string(),
                national_id: "12345678900".to_string(),
                address: "Rua A, 123 - Centro".to_string(),
                phone: "11999999999".to_string(),
                injury_notes: None,
                treatment_notes: None,
                validation_code: ValidationCode::generate(),
                qr_payload: None,
            })
            .await
        else {
            panic!("registration insert failed");
        };
        let _ = store
            .update_registration_payment(
                registration.id,
                PaymentUpdate {
                    status: PaymentStatus::Paid,
                    paid_amount: Some(50.0),
                    payment_date: Some(Utc::now()),
                },
            )
            .await;
        store
    }

    #[tokio::test]
    async fn export_contains_header_and_quoted_address() {
        let store = seed_store().await;
        let service = ExportService::new(store as Arc<dyn RecordStore>, RetryPolicy::none());

        let export = service
            .export_registrations(RegistrationFilter::default())
            .await;
        let Ok(export) = export else {
            panic!("export failed");
        };

        let mut lines = export.content.lines();
        let Some(header) = lines.next() else {
            panic!("missing header row");
        };
        assert!(header.starts_with("Full Name,National ID"));

        let Some(data) = lines.next() else {
            panic!("missing data row");
        };
        assert!(data.contains("\"Rua A, 123 - Centro\""));
        assert!(data.contains("50.00"));
        assert!(export.filename.ends_with(".csv"));
    }

    #[tokio::test]
    async fn empty_result_set_yields_no_file() {
        let store = Arc::new(MemoryStore::new());
        let service = ExportService::new(store as Arc<dyn RecordStore>, RetryPolicy::none());

        let export = service
            .export_registrations(RegistrationFilter::default())
            .await;
        assert!(matches!(export, Err(GatewayError::EmptyExport)));
    }
}
