/*
 * Responsibility
 * - SICA (通関システム) report の request DTO
 * - 税関コード / 参照番号 / 請求書ステータスの形式チェック
 */
use chrono::NaiveDate;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::api::v1::dto::common::{check_date_range, trim, trim_opt};
use crate::api::v1::extractors::RequestSchema;

pub const INVOICE_STATUSES: [&str; 3] = ["issued", "paid", "cancelled"];

fn customs_office_code(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("customs_office")
            .with_message("must be a 3-digit customs office code".into()))
    }
}

fn operation_reference(value: &str) -> Result<(), ValidationError> {
    let ok = !value.is_empty()
        && value.len() <= 30
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'/');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("reference")
            .with_message("must be 1-30 letters, digits, '-' or '/'".into()))
    }
}

fn invoice_status(value: &str) -> Result<(), ValidationError> {
    if INVOICE_STATUSES.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("status")
            .with_message("must be one of: issued, paid, cancelled".into()))
    }
}

/// `GET /reports/sica/customs-entries`
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "customs_entries_range"))]
pub struct CustomsEntriesQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub client_id: Option<i32>,
    #[validate(custom(function = "customs_office_code"))]
    pub customs_office: Option<String>,
}

fn customs_entries_range(q: &CustomsEntriesQuery) -> Result<(), ValidationError> {
    check_date_range(q.from, q.to)
}

impl RequestSchema for CustomsEntriesQuery {
    fn normalize(&mut self) {
        trim_opt(&mut self.customs_office);
    }
}

/// `GET /reports/sica/operations/{reference}`
#[derive(Debug, Deserialize, Validate)]
pub struct OperationPath {
    #[validate(custom(function = "operation_reference"))]
    pub reference: String,
}

impl RequestSchema for OperationPath {
    fn normalize(&mut self) {
        trim(&mut self.reference);
        self.reference.make_ascii_uppercase();
    }
}

/// `GET /reports/sica/pending-revalidations`
#[derive(Debug, Deserialize, Validate)]
pub struct PendingRevalidationsQuery {
    #[validate(custom(function = "customs_office_code"))]
    pub customs_office: Option<String>,
}

impl RequestSchema for PendingRevalidationsQuery {
    fn normalize(&mut self) {
        trim_opt(&mut self.customs_office);
    }
}

/// `GET /reports/sica/invoices`
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "invoices_range"))]
pub struct InvoicesQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub client_id: Option<i32>,
}

fn invoices_range(q: &InvoicesQuery) -> Result<(), ValidationError> {
    check_date_range(q.from, q.to)
}

impl RequestSchema for InvoicesQuery {}

/// `PUT /reports/sica/invoices/{invoice_id}/status` (path)
#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceStatusPath {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub invoice_id: i64,
}

impl RequestSchema for InvoiceStatusPath {}

/// `PUT /reports/sica/invoices/{invoice_id}/status` (body)
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateInvoiceStatusRequest {
    #[validate(custom(function = "invoice_status"))]
    pub status: String,
    #[validate(length(max = 250, message = "must be at most 250 characters"))]
    pub reason: Option<String>,
    // Lets the mutation be retried safely on transient failures.
    #[validate(length(min = 8, max = 64, message = "must be 8-64 characters"))]
    pub idempotency_key: Option<String>,
}

impl RequestSchema for UpdateInvoiceStatusRequest {
    fn normalize(&mut self) {
        trim(&mut self.status);
        self.status.make_ascii_lowercase();
        trim_opt(&mut self.reason);
        trim_opt(&mut self.idempotency_key);
    }
}
