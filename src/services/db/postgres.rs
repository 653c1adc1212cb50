//! PostgreSQL target (warehouse) backed by a sqlx pool.
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use sqlx::postgres::{
    PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgValueFormat,
};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::config::DbTargetConfig;
use crate::services::db::client::{
    BindValue, Command, DbError, DbResult, DbTarget, Record, Statement, check_procedure_name,
    placeholders,
};
use crate::services::db::{sqlx_error, text_fallback};

#[derive(Debug, Clone)]
pub struct PostgresTarget {
    name: &'static str,
    connect_timeout: Duration,
    pool: PgPool,
}

impl PostgresTarget {
    /// Builds the pool without connecting; connections are opened on first use.
    pub fn new(config: &DbTargetConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .application_name("customs-reports");

        let pool = PgPoolOptions::new()
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

/// Set-returning functions are read with `SELECT * FROM name($1, $2)`.
pub fn render(statement: &Statement) -> DbResult<String> {
    match statement.command() {
        Command::Procedure(name) => {
            check_procedure_name(name)?;
            let params = placeholders(statement.binds().len(), |i| format!("${i}"));
            Ok(format!("SELECT * FROM {name}({params})"))
        }
        Command::Sql(text) => Ok(text.to_string()),
    }
}

fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &BindValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        BindValue::Null => query.bind(Option::<String>::None),
        BindValue::Bool(v) => query.bind(*v),
        BindValue::Int(v) => query.bind(*v),
        BindValue::Float(v) => query.bind(*v),
        BindValue::Text(v) => query.bind(v.clone()),
        BindValue::Date(v) => query.bind(*v),
        BindValue::DateTime(v) => query.bind(*v),
        // Functions take the payload as text and cast it (`$1::jsonb`)
        BindValue::Json(v) => query.bind(v.to_string()),
    }
}

fn get<'r, T>(row: &'r PgRow, index: usize) -> DbResult<Option<T>>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| DbError::Decode(e.to_string()))
}

fn column_to_json(row: &PgRow, index: usize) -> DbResult<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| DbError::Decode(e.to_string()))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOL" => get::<bool>(row, index)?.map(Value::Bool),
        "INT2" => get::<i16>(row, index)?.map(Value::from),
        "INT4" => get::<i32>(row, index)?.map(Value::from),
        "INT8" => get::<i64>(row, index)?.map(Value::from),
        "FLOAT4" => get::<f32>(row, index)?.map(|f| Value::from(f64::from(f))),
        "FLOAT8" => get::<f64>(row, index)?.map(Value::from),
        "NUMERIC" => get::<Decimal>(row, index)?.map(|d| Value::String(d.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            get::<String>(row, index)?.map(Value::String)
        }
        "UUID" => get::<Uuid>(row, index)?.map(|u| Value::String(u.to_string())),
        "DATE" => get::<NaiveDate>(row, index)?.map(|d| Value::String(d.to_string())),
        "TIME" => get::<NaiveTime>(row, index)?.map(|t| Value::String(t.to_string())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, index)?
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, index)?.map(|d| Value::String(d.to_rfc3339())),
        "JSON" | "JSONB" => get::<Value>(row, index)?,
        "BYTEA" => get::<Vec<u8>>(row, index)?.map(Value::from),
        _ => {
            // binary-format values have no text form to fall back to
            let text = match raw.format() {
                PgValueFormat::Text => row.try_get_unchecked::<Option<String>, _>(index),
                PgValueFormat::Binary => Err(sqlx::Error::Decode(
                    "binary value without a text mapping".into(),
                )),
            };
            return text_fallback("postgres", &type_name, text);
        }
    };

    Ok(value.unwrap_or(Value::Null))
}

fn row_to_record(row: &PgRow) -> DbResult<Record> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), column_to_json(row, index)?);
    }
    Ok(record)
}

#[async_trait]
impl DbTarget for PostgresTarget {
    fn backend_name(&self) -> &'static str {
        "postgres"
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
    fn function_call_renders_dollar_parameters() {
        let stmt = Statement::procedure("rpt_inventory")
            .bind(3_i32)
            .bind(Option::<NaiveDate>::None)
            .bind("SKU-1");

        assert_eq!(
            render(&stmt).unwrap(),
            "SELECT * FROM rpt_inventory($1, $2, $3)"
        );
    }

    #[test]
    fn fixed_sql_is_passed_through() {
        let stmt = Statement::sql("SELECT 1 WHERE $1 = $1").bind("O'Brien");
        assert_eq!(render(&stmt).unwrap(), "SELECT 1 WHERE $1 = $1");
    }
}
