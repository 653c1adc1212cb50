/*
 * Responsibility
 * - 会計 DB (SQL Server) 向け report adapter
 */
use chrono::NaiveDate;

use crate::repos::error::RepoError;
use crate::services::db::{ReportDb, RowSet, Statement};

pub const ACCOUNTS_RECEIVABLE: &str = "dbo.sp_rpt_accounts_receivable";
pub const COLLECTIONS: &str = "dbo.sp_rpt_collections";

pub async fn receivables(
    db: &ReportDb,
    as_of: NaiveDate,
    client_id: Option<i32>,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(
            Statement::procedure(ACCOUNTS_RECEIVABLE)
                .bind(as_of)
                .bind(client_id),
        )
        .await?;

    Ok(rows)
}

pub async fn collections(
    db: &ReportDb,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(Statement::procedure(COLLECTIONS).bind(from).bind(to))
        .await?;

    Ok(rows)
}
