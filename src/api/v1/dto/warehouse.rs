/*
 * Responsibility
 * - 倉庫 (warehouse, PostgreSQL) report の request DTO
 */
use chrono::NaiveDate;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::api::v1::dto::common::{check_date_range, trim_opt};
use crate::api::v1::extractors::RequestSchema;

/// `GET /reports/warehouse/inventory`
#[derive(Debug, Deserialize, Validate)]
pub struct InventoryQuery {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub warehouse_id: i32,
    pub as_of: Option<NaiveDate>,
    #[validate(length(min = 1, max = 40, message = "must be 1-40 characters"))]
    pub sku: Option<String>,
}

impl RequestSchema for InventoryQuery {
    fn normalize(&mut self) {
        trim_opt(&mut self.sku);
    }
}

/// `GET /reports/warehouse/dwell-times`
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "dwell_range"))]
pub struct DwellQuery {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub warehouse_id: i32,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn dwell_range(q: &DwellQuery) -> Result<(), ValidationError> {
    check_date_range(q.from, q.to)
}

impl RequestSchema for DwellQuery {}
