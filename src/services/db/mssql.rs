//! SQL Server target (SICA, accounting) backed by a bb8 pool of tiberius clients.
use async_trait::async_trait;
use bb8::{ManageConnection, Pool, RunError};
use bb8_tiberius::ConnectionManager;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tiberius::{AuthMethod, ColumnData, FromSql, Query};

use crate::config::DbTargetConfig;
use crate::services::db::client::{
    BindValue, Command, DbError, DbResult, DbTarget, Record, Statement, check_procedure_name,
    placeholders,
};

type Client = <ConnectionManager as ManageConnection>::Connection;

/// A pooled tiberius client. `unread` is set while a statement's results are still on the wire.
pub struct TrackedClient {
    client: Client,
    unread: bool,
}

/// bb8-tiberius manager that discards connections abandoned mid-stream
/// (a call that timed out while tiberius was still reading rows).
pub struct TrackedManager(ConnectionManager);

#[async_trait]
impl ManageConnection for TrackedManager {
    type Connection = TrackedClient;
    type Error = bb8_tiberius::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let client = self.0.connect().await?;
        Ok(TrackedClient {
            client,
            unread: false,
        })
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        self.0.is_valid(&mut conn.client).await
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        if conn.unread {
            tracing::warn!("dropping mssql connection with unread results");
            return true;
        }
        self.0.has_broken(&mut conn.client)
    }
}

// Marks the connection until `work` completes. A future dropped by a timeout leaves the mark.
async fn read_through<T>(unread: &mut bool, work: impl Future<Output = T>) -> T {
    *unread = true;
    let out = work.await;
    *unread = false;
    out
}

pub struct MssqlTarget {
    name: &'static str,
    pool: Pool<TrackedManager>,
    connect_timeout: Duration,
}

impl MssqlTarget {
    /// Builds the pool without connecting; connections are opened on first use.
    pub fn new(config: &DbTargetConfig) -> Self {
        let mut tds = tiberius::Config::new();
        tds.host(&config.host);
        tds.port(config.port);
        tds.database(&config.database);
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));
        tds.application_name("customs-reports");
        if config.trust_cert {
            tds.trust_cert();
        }

        let pool = Pool::builder()
            .max_size(config.pool_max)
            .connection_timeout(config.connect_timeout)
            .build_unchecked(TrackedManager(ConnectionManager::new(tds)));

        Self {
            name: config.name,
            pool,
            connect_timeout: config.connect_timeout,
        }
    }

    fn map_pool_error(&self, e: RunError<bb8_tiberius::Error>) -> DbError {
        match e {
            RunError::TimedOut => DbError::AcquireTimeout(self.connect_timeout),
            RunError::User(e) => DbError::Connect(e.to_string()),
        }
    }
}

impl std::fmt::Debug for MssqlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlTarget")
            .field("name", &self.name)
            .field("state", &self.pool.state())
            .finish()
    }
}

/// `EXEC name @P1, @P2` or the fixed SQL as written.
pub fn render(statement: &Statement) -> DbResult<String> {
    match statement.command() {
        Command::Procedure(name) => {
            check_procedure_name(name)?;
            let params = placeholders(statement.binds().len(), |i| format!("@P{i}"));
            if params.is_empty() {
                Ok(format!("EXEC {name}"))
            } else {
                Ok(format!("EXEC {name} {params}"))
            }
        }
        Command::Sql(text) => Ok(text.to_string()),
    }
}

fn bind(query: &mut Query<'_>, value: &BindValue) {
    match value {
        BindValue::Null => query.bind(Option::<String>::None),
        BindValue::Bool(v) => query.bind(*v),
        BindValue::Int(v) => query.bind(*v),
        BindValue::Float(v) => query.bind(*v),
        BindValue::Text(v) => query.bind(v.clone()),
        BindValue::Date(v) => query.bind(*v),
        BindValue::DateTime(v) => query.bind(*v),
        BindValue::Json(v) => query.bind(v.to_string()),
    }
}

fn map_tiberius_error(e: tiberius::error::Error) -> DbError {
    match e {
        tiberius::error::Error::Io { .. } | tiberius::error::Error::Tls(_) => {
            DbError::Connect(e.to_string())
        }
        _ => DbError::Execute(e.to_string()),
    }
}

fn from_sql<'a, T: FromSql<'a>>(data: &'a ColumnData<'static>) -> DbResult<Option<T>> {
    T::from_sql(data).map_err(|e| DbError::Decode(e.to_string()))
}

fn column_to_json(data: ColumnData<'static>) -> DbResult<Value> {
    let value = match &data {
        ColumnData::U8(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|f| Value::from(f64::from(f))).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => v
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Null),
        // Decimals keep their exact digits as text
        ColumnData::Numeric(v) => v
            .map(|n| Value::String(n.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| Value::String(x.clone().into_owned().into_string()))
            .unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| Value::from(b.to_vec()))
            .unwrap_or(Value::Null),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            from_sql::<NaiveDateTime>(&data)?
                .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
                .unwrap_or(Value::Null)
        }
        ColumnData::Date(_) => from_sql::<NaiveDate>(&data)?
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Time(_) => from_sql::<NaiveTime>(&data)?
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::DateTimeOffset(_) => from_sql::<DateTime<FixedOffset>>(&data)?
            .map(|d| Value::String(d.to_rfc3339()))
            .unwrap_or(Value::Null),
    };

    Ok(value)
}

fn row_to_record(row: tiberius::Row) -> DbResult<Record> {
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut record = Record::new();
    for (name, data) in names.into_iter().zip(row) {
        record.insert(name, column_to_json(data)?);
    }
    Ok(record)
}

#[async_trait]
impl DbTarget for MssqlTarget {
    fn backend_name(&self) -> &'static str {
        "mssql"
    }

    fn target_name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, statement: &Statement) -> DbResult<Vec<Record>> {
        let sql = render(statement)?;

        // Returned to the pool when `pooled` drops, unless it is still marked unread.
        let mut pooled = self.pool.get().await.map_err(|e| self.map_pool_error(e))?;
        let TrackedClient { client, unread } = &mut *pooled;

        let mut query = Query::new(sql);
        for value in statement.binds() {
            bind(&mut query, value);
        }

        let rows = read_through(unread, async move {
            query
                .query(client)
                .await
                .map_err(map_tiberius_error)?
                .into_first_result()
                .await
                .map_err(map_tiberius_error)
        })
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn ping(&self) -> DbResult<()> {
        let mut pooled = self.pool.get().await.map_err(|e| self.map_pool_error(e))?;
        let TrackedClient { client, unread } = &mut *pooled;

        read_through(unread, async move {
            Query::new("SELECT 1")
                .query(client)
                .await
                .map_err(map_tiberius_error)?
                .into_first_result()
                .await
                .map_err(map_tiberius_error)
        })
        .await?;

        Ok(())
    }
}
