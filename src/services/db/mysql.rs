//! MySQL target (tracking) backed by a sqlx pool.
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row, TypeInfo, ValueRef};

use crate::config::DbTargetConfig;
use crate::services::db::client::{
    BindValue, Command, DbError, DbResult, DbTarget, Record, Statement, check_procedure_name,
    placeholders,
};
use crate::services::db::{sqlx_error, text_fallback};

#[derive(Debug, Clone)]
pub struct MySqlTarget {
    name: &'static str,
    connect_timeout: Duration,
    pool: MySqlPool,
}

impl MySqlTarget {
    /// Builds the pool without connecting; connections are opened on first use.
    pub fn new(config: &DbTargetConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(options);

        Self {
            name: config.name,
            connect_timeout: config.connect_timeout,
            pool,
        }
    }
}

/// `CALL name(?, ?)` or the fixed SQL as written.
pub fn render(statement: &Statement) -> DbResult<String> {
    match statement.command() {
        Command::Procedure(name) => {
            check_procedure_name(name)?;
            let params = placeholders(statement.binds().len(), |_| "?".to_string());
            Ok(format!("CALL {name}({params})"))
        }
        Command::Sql(text) => Ok(text.to_string()),
    }
}

fn bind<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &BindValue,
) -> Query<'q, MySql, MySqlArguments> {
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

fn get<'r, T>(row: &'r MySqlRow, index: usize) -> DbResult<Option<T>>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| DbError::Decode(e.to_string()))
}

fn column_to_json(row: &MySqlRow, index: usize) -> DbResult<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| DbError::Decode(e.to_string()))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOLEAN" => get::<bool>(row, index)?.map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            get::<i64>(row, index)?.map(Value::from)
        }
        name if name.ends_with(" UNSIGNED") => get::<u64>(row, index)?.map(Value::from),
        "FLOAT" | "DOUBLE" => get::<f64>(row, index)?.map(Value::from),
        "DECIMAL" => get::<Decimal>(row, index)?.map(|d| Value::String(d.to_string())),
        "DATE" => get::<NaiveDate>(row, index)?.map(|d| Value::String(d.to_string())),
        "TIME" => get::<NaiveTime>(row, index)?.map(|t| Value::String(t.to_string())),
        "DATETIME" => get::<NaiveDateTime>(row, index)?
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMP" => get::<DateTime<Utc>>(row, index)?.map(|d| Value::String(d.to_rfc3339())),
        "JSON" => get::<Value>(row, index)?,
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            get::<Vec<u8>>(row, index)?.map(Value::from)
        }
        _ => {
            let text = row.try_get_unchecked::<Option<String>, _>(index);
            return text_fallback("mysql", &type_name, text);
        }
    };

    Ok(value.unwrap_or(Value::Null))
}

fn row_to_record(row: &MySqlRow) -> DbResult<Record> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), column_to_json(row, index)?);
    }
    Ok(record)
}

#[async_trait]
impl DbTarget for MySqlTarget {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    fn target_name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, statement: &Statement) -> DbResult<Vec<Record>> {
        let sql = render(statement)?;

        let mut query = sqlx::query(&sql);
        for value in statement.binds() {
            query = bind(query, value);
        }

        // The pool hands the connection back when the future completes or is dropped.
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| sqlx_error(e, self.connect_timeout))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| sqlx_error(e, self.connect_timeout))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_renders_question_marks() {
        let stmt = Statement::procedure("sp_search_shipments").bind(serde_json::json!({}));
        assert_eq!(render(&stmt).unwrap(), "CALL sp_search_shipments(?)");
    }

    #[test]
    fn procedure_without_parameters_keeps_parentheses() {
        let stmt = Statement::procedure("sp_open_containers");
        assert_eq!(render(&stmt).unwrap(), "CALL sp_open_containers()");
    }

    #[test]
    fn invalid_procedure_name_is_rejected() {
        let stmt = Statement::procedure("sp_x(); DROP TABLE t; --");
        assert!(matches!(render(&stmt), Err(DbError::InvalidStatement(_))));
    }
}
