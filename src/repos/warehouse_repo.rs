/*
 * Responsibility
 * - 倉庫 DB (PostgreSQL) 向け report adapter
 * - 関数の overload 解決のため、NULL になり得る引数は SQL 側で型を明示する
 */
use chrono::NaiveDate;

use crate::repos::error::RepoError;
use crate::services::db::{ReportDb, RowSet, Statement};

pub const INVENTORY: &str = "SELECT * FROM rpt_inventory($1::int4, $2::date, $3::text)";
pub const DWELL_TIMES: &str = "SELECT * FROM rpt_dwell_times($1::int4, $2::date, $3::date)";

pub async fn inventory(
    db: &ReportDb,
    warehouse_id: i32,
    as_of: Option<NaiveDate>,
    sku: Option<&str>,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(
            Statement::sql(INVENTORY)
                .bind(warehouse_id)
                .bind(as_of)
                .bind(sku),
        )
        .await?;

    Ok(rows)
}

pub async fn dwell_times(
    db: &ReportDb,
    warehouse_id: i32,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(
            Statement::sql(DWELL_TIMES)
                .bind(warehouse_id)
                .bind(from)
                .bind(to),
        )
        .await?;

    Ok(rows)
}
