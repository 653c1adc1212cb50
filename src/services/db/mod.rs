/*
 * Responsibility
 * - database target ごとの pool (mssql / mysql / postgres) の公開インターフェース
 * - ReportDb: 全 report 呼び出しが通る単一の実行ラッパー (timeout / retry / log / empty 正規化)
 * - Targets: 起動時に一度だけ組み立て、AppState 経由で注入する
 */
pub mod client;
pub mod factory;
pub mod mssql;
pub mod mysql;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

pub use client::{BindValue, DbError, DbResult, DbTarget, Record, RowSet, Statement};
pub use factory::build_targets;

use crate::config::DbTargetConfig;

pub(crate) fn sqlx_error(e: sqlx::Error, acquire_timeout: Duration) -> DbError {
    match e {
        sqlx::Error::PoolTimedOut => DbError::AcquireTimeout(acquire_timeout),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => DbError::Connect(e.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => DbError::Decode(e.to_string()),
        _ => DbError::Execute(e.to_string()),
    }
}

/// Column of a type the adapter has no mapping for: its text form, or a decode error.
pub(crate) fn text_fallback(
    backend: &str,
    type_name: &str,
    decoded: Result<Option<String>, sqlx::Error>,
) -> DbResult<serde_json::Value> {
    match decoded {
        Ok(text) => {
            tracing::debug!(backend, type_name, "column decoded as text");
            Ok(text.map_or(serde_json::Value::Null, serde_json::Value::String))
        }
        Err(e) => Err(DbError::Decode(format!(
            "{backend} column type {type_name} is not supported: {e}"
        ))),
    }
}

/// Timeout and retry bounds for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub query_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl CallPolicy {
    pub fn from_config(config: &DbTargetConfig) -> Self {
        Self {
            query_timeout: config.query_timeout,
            max_retries: config.connect_retries,
            retry_backoff: Duration::from_millis(200),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2_u32.saturating_pow(attempt.min(16)))
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

/// Handle to one database target, cheap to clone.
#[derive(Clone)]
pub struct ReportDb {
    target: Arc<dyn DbTarget>,
    policy: CallPolicy,
}

impl std::fmt::Debug for ReportDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportDb")
            .field("target", &self.target.target_name())
            .field("backend", &self.target.backend_name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ReportDb {
    pub fn new(target: Arc<dyn DbTarget>, policy: CallPolicy) -> Self {
        Self { target, policy }
    }

    pub fn target_name(&self) -> &'static str {
        self.target.target_name()
    }

    pub fn backend_name(&self) -> &'static str {
        self.target.backend_name()
    }

    /// Run one statement against this target.
    ///
    /// - each attempt is bounded by `query_timeout`
    /// - transient failures are retried with exponential backoff, only for retryable statements
    /// - failures are logged here; callers get the typed error and decide the HTTP shape
    pub async fn run(&self, statement: Statement) -> DbResult<RowSet> {
        let mut attempt = 0;

        loop {
            let outcome =
                match tokio::time::timeout(self.policy.query_timeout, self.target.fetch(&statement))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(DbError::QueryTimeout(self.policy.query_timeout)),
                };

            match outcome {
                Ok(records) => {
                    let rows = RowSet::from_records(records);
                    if rows.is_empty() {
                        tracing::debug!(
                            target_db = self.target_name(),
                            statement = statement.label(),
                            "report call returned no rows"
                        );
                    }
                    return Ok(rows);
                }
                Err(err)
                    if err.is_transient()
                        && statement.is_retryable()
                        && attempt < self.policy.max_retries =>
                {
                    let delay = self.policy.backoff(attempt);
                    attempt += 1;
                    tracing::warn!(
                        target_db = self.target_name(),
                        backend = self.backend_name(),
                        statement = statement.label(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient database failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::error!(
                        target_db = self.target_name(),
                        backend = self.backend_name(),
                        statement = statement.label(),
                        attempts = attempt + 1,
                        error = %err,
                        "report call failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    pub async fn ping(&self) -> DbResult<()> {
        match tokio::time::timeout(self.policy.query_timeout, self.target.ping()).await {
            Ok(result) => result,
            Err(_) => Err(DbError::QueryTimeout(self.policy.query_timeout)),
        }
    }
}

/// Every database target the service talks to.
#[derive(Clone, Debug)]
pub struct Targets {
    pub sica: ReportDb,
    pub accounting: ReportDb,
    pub tracking: ReportDb,
    pub warehouse: ReportDb,
}
