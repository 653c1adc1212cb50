/*
 * Responsibility
 * - tracking (MySQL) report の request DTO
 * - shipment search は body 全体を JSON payload として stored procedure に渡す
 * - container 番号は ISO 6346 (owner code 4 文字 + 6 桁 + check digit)
 */
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::v1::dto::common::{check_date_range, trim, trim_opt};
use crate::api::v1::extractors::RequestSchema;
use crate::api::v1::extractors::valid::index_error;

pub const SHIPMENT_STATUSES: [&str; 4] = ["booked", "in_transit", "arrived", "delivered"];
pub const MAX_PAGE_SIZE: u32 = 500;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

fn carrier_codes(values: &[String]) -> Result<(), ValidationError> {
    for (i, code) in values.iter().enumerate() {
        let ok = (2..=4).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase());
        if !ok {
            return Err(index_error("carrier", i, "must be a 2-4 letter carrier code"));
        }
    }
    Ok(())
}

fn shipment_status(value: &str) -> Result<(), ValidationError> {
    if SHIPMENT_STATUSES.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("status")
            .with_message("must be one of: booked, in_transit, arrived, delivered".into()))
    }
}

/// `POST /reports/tracking/shipments/search`
///
/// Serialized as-is into the `sp_search_shipments` JSON argument.
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "shipment_search_range"))]
pub struct ShipmentSearchRequest {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    #[validate(
        length(max = 20, message = "must list at most 20 carriers"),
        custom(function = "carrier_codes")
    )]
    pub carriers: Vec<String>,
    #[validate(custom(function = "shipment_status"))]
    pub status: Option<String>,
    #[validate(length(max = 40, message = "must be at most 40 characters"))]
    pub reference: Option<String>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 10000, message = "must be between 1 and 10000"))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 500, message = "must be between 1 and 500"))]
    pub page_size: u32,
}

fn shipment_search_range(q: &ShipmentSearchRequest) -> Result<(), ValidationError> {
    match (q.from, q.to) {
        (Some(from), Some(to)) => check_date_range(from, to),
        _ => Ok(()),
    }
}

impl RequestSchema for ShipmentSearchRequest {
    fn normalize(&mut self) {
        for code in &mut self.carriers {
            trim(code);
            code.make_ascii_uppercase();
        }
        trim_opt(&mut self.status);
        if let Some(status) = &mut self.status {
            status.make_ascii_lowercase();
        }
        trim_opt(&mut self.reference);
    }
}

/// ISO 6346 letter values: A=10 upward, skipping multiples of 11.
fn letter_value(b: u8) -> u32 {
    let mut value = 10;
    for _ in b'A'..b {
        value += 1;
        if value % 11 == 0 {
            value += 1;
        }
    }
    value
}

pub fn is_iso6346(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 11
        || !bytes[..4].iter().all(u8::is_ascii_uppercase)
        || !bytes[4..].iter().all(u8::is_ascii_digit)
    {
        return false;
    }

    let sum: u32 = bytes[..10]
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let v = if b.is_ascii_digit() {
                u32::from(b - b'0')
            } else {
                letter_value(b)
            };
            v << i
        })
        .sum();

    sum % 11 % 10 == u32::from(bytes[10] - b'0')
}

fn iso6346_container(value: &str) -> Result<(), ValidationError> {
    if is_iso6346(value) {
        Ok(())
    } else {
        Err(ValidationError::new("container_number")
            .with_message("must be an ISO 6346 container number".into()))
    }
}

/// `GET /reports/tracking/containers/{container_number}/events`
#[derive(Debug, Deserialize, Validate)]
pub struct ContainerPath {
    #[validate(custom(function = "iso6346_container"))]
    pub container_number: String,
}

impl RequestSchema for ContainerPath {
    fn normalize(&mut self) {
        trim(&mut self.container_number);
        self.container_number.make_ascii_uppercase();
    }
}
