/*
 * Responsibility
 * - SICA (SQL Server) 向け report adapter
 * - 業務ロジックは stored procedure 側。ここは名前と引数順の対応表
 */
use chrono::NaiveDate;

use crate::repos::error::RepoError;
use crate::services::db::{ReportDb, RowSet, Statement};

pub const CUSTOMS_ENTRIES: &str = "dbo.sp_rpt_customs_entries";
pub const PENDING_REVALIDATIONS: &str = "dbo.sp_rpt_pending_revalidations";
pub const INVOICES: &str = "dbo.sp_rpt_invoices";
pub const SET_INVOICE_STATUS: &str = "dbo.sp_set_invoice_status";

pub const OPERATION_BY_REFERENCE: &str = r#"
    SELECT o.reference, o.customs_office, o.regime, o.client_id, o.client_name,
           o.entry_date, o.payment_date, o.status
    FROM dbo.operations AS o
    WHERE o.reference = @P1
"#;

pub async fn customs_entries(
    db: &ReportDb,
    from: NaiveDate,
    to: NaiveDate,
    client_id: Option<i32>,
    customs_office: Option<&str>,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(
            Statement::procedure(CUSTOMS_ENTRIES)
                .bind(from)
                .bind(to)
                .bind(client_id)
                .bind(customs_office),
        )
        .await?;

    Ok(rows)
}

pub async fn operation_by_reference(db: &ReportDb, reference: &str) -> Result<RowSet, RepoError> {
    let rows = db
        .run(Statement::sql(OPERATION_BY_REFERENCE).bind(reference))
        .await?;

    Ok(rows)
}

pub async fn pending_revalidations(
    db: &ReportDb,
    customs_office: Option<&str>,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(Statement::procedure(PENDING_REVALIDATIONS).bind(customs_office))
        .await?;

    Ok(rows)
}

pub async fn invoices(
    db: &ReportDb,
    from: NaiveDate,
    to: NaiveDate,
    client_id: Option<i32>,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(
            Statement::procedure(INVOICES)
                .bind(from)
                .bind(to)
                .bind(client_id),
        )
        .await?;

    Ok(rows)
}

/// State-changing: only retried when the caller sent an idempotency key,
/// which the procedure also receives so a replay is a no-op.
pub async fn update_invoice_status(
    db: &ReportDb,
    invoice_id: i64,
    status: &str,
    reason: Option<&str>,
    idempotency_key: Option<&str>,
) -> Result<RowSet, RepoError> {
    let rows = db
        .run(
            Statement::procedure(SET_INVOICE_STATUS)
                .bind(invoice_id)
                .bind(status)
                .bind(reason)
                .bind(idempotency_key)
                .mutation()
                .idempotency_key(idempotency_key.map(str::to_owned)),
        )
        .await?;

    Ok(rows)
}
