/*
 * Responsibility
 * - tracking DB (MySQL) 向け report adapter
 * - shipment search は filter 一式を JSON 1 引数で渡す
 */
use serde_json::Value;

use crate::repos::error::RepoError;
use crate::services::db::{ReportDb, RowSet, Statement};

pub const SEARCH_SHIPMENTS: &str = "sp_search_shipments";

pub const CONTAINER_EVENTS: &str = r#"
    SELECT e.container_number, e.event_code, e.event_description, e.location,
           e.vessel, e.voyage, e.event_time
    FROM container_events AS e
    WHERE e.container_number = ?
    ORDER BY e.event_time ASC
"#;

pub async fn search_shipments(db: &ReportDb, filters: Value) -> Result<RowSet, RepoError> {
    let rows = db
        .run(Statement::procedure(SEARCH_SHIPMENTS).bind(filters))
        .await?;

    Ok(rows)
}

pub async fn container_events(db: &ReportDb, container_number: &str) -> Result<RowSet, RepoError> {
    let rows = db
        .run(Statement::sql(CONTAINER_EVENTS).bind(container_number))
        .await?;

    Ok(rows)
}
