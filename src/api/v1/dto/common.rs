//! Checks shared by several report DTOs.

use chrono::NaiveDate;
use validator::ValidationError;

use crate::api::v1::extractors::valid::schema_error;

/// Longest reporting window accepted by the stored procedures.
pub const MAX_RANGE_DAYS: i64 = 366;

pub fn check_date_range(from: NaiveDate, to: NaiveDate) -> Result<(), ValidationError> {
    if from > to {
        return Err(schema_error("from", "must not be after 'to'"));
    }
    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(schema_error("to", "range must not exceed 366 days"));
    }
    Ok(())
}

/// Trim an optional text field; blank becomes `None`.
pub fn trim_opt(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

pub fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
