/*
 * Responsibility
 * - 会計 (accounting) report の request DTO
 */
use chrono::NaiveDate;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::api::v1::dto::common::check_date_range;
use crate::api::v1::extractors::RequestSchema;

/// `GET /reports/accounting/receivables`
#[derive(Debug, Deserialize, Validate)]
pub struct ReceivablesQuery {
    pub as_of: NaiveDate,
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub client_id: Option<i32>,
}

impl RequestSchema for ReceivablesQuery {}

/// `GET /reports/accounting/collections`
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "collections_range"))]
pub struct CollectionsQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn collections_range(q: &CollectionsQuery) -> Result<(), ValidationError> {
    check_date_range(q.from, q.to)
}

impl RequestSchema for CollectionsQuery {}
