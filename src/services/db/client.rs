//! Database target interface used by the report repos.
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// One result row: column name -> JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Result type for database target operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database-layer errors.
///
/// The message strings may contain server text (object names, login info).
/// They are for logs only and never reach an HTTP response.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database connection error: {0}")]
    Connect(String),
    #[error("no pooled connection within {0:?}")]
    AcquireTimeout(Duration),
    #[error("database statement timed out after {0:?}")]
    QueryTimeout(Duration),
    #[error("database execution error: {0}")]
    Execute(String),
    #[error("database value error: {0}")]
    Decode(String),
    #[error("invalid statement: {0}")]
    InvalidStatement(String),
}

impl DbError {
    /// Failures that happened before the statement reached the server.
    /// A statement timeout is not one: the server may still be working on it.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Connect(_) | DbError::AcquireTimeout(_))
    }
}

/// A typed bind parameter. Caller input only ever travels in one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Object graph serialized to a single text parameter; the procedure parses it server-side.
    Json(serde_json::Value),
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue::Bool(v)
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Int(v.into())
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Int(v)
    }
}

impl From<u32> for BindValue {
    fn from(v: u32) -> Self {
        BindValue::Int(v.into())
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Float(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<NaiveDate> for BindValue {
    fn from(v: NaiveDate) -> Self {
        BindValue::Date(v)
    }
}

impl From<NaiveDateTime> for BindValue {
    fn from(v: NaiveDateTime) -> Self {
        BindValue::DateTime(v)
    }
}

impl From<serde_json::Value> for BindValue {
    fn from(v: serde_json::Value) -> Self {
        BindValue::Json(v)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(BindValue::Null)
    }
}

/// What gets sent to the server. Both variants only accept `'static` text,
/// so statement text can never be assembled from request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Stored procedure (or set-returning function) name; each backend renders the call.
    Procedure(&'static str),
    /// Fixed SQL written in the target backend's placeholder dialect.
    Sql(&'static str),
}

/// A single report call: command + bind values + retry semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    command: Command,
    binds: Vec<BindValue>,
    idempotent: bool,
    idempotency_key: Option<String>,
}

impl Statement {
    pub fn procedure(name: &'static str) -> Self {
        Self::new(Command::Procedure(name))
    }

    pub fn sql(text: &'static str) -> Self {
        Self::new(Command::Sql(text))
    }

    fn new(command: Command) -> Self {
        Self {
            command,
            binds: Vec::new(),
            idempotent: true,
            idempotency_key: None,
        }
    }

    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// Marks the statement as state-changing: it is not retried unless an idempotency key is set.
    pub fn mutation(mut self) -> Self {
        self.idempotent = false;
        self
    }

    pub fn idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    pub fn is_retryable(&self) -> bool {
        self.idempotent || self.idempotency_key.is_some()
    }

    /// Short description for logs (never includes bind values).
    pub fn label(&self) -> &'static str {
        match self.command {
            Command::Procedure(name) => name,
            Command::Sql(_) => "inline-sql",
        }
    }
}

/// Rows returned by a report call. Zero rows is `Empty`, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSet {
    Rows(Vec<Record>),
    Empty,
}

impl RowSet {
    pub fn from_records(records: Vec<Record>) -> Self {
        if records.is_empty() {
            RowSet::Empty
        } else {
            RowSet::Rows(records)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RowSet::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            RowSet::Rows(rows) => rows.len(),
            RowSet::Empty => 0,
        }
    }
}

// Serialized as a plain JSON array so handlers can return it directly.
impl Serialize for RowSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowSet::Rows(rows) => rows.serialize(serializer),
            RowSet::Empty => serializer.collect_seq(std::iter::empty::<&Record>()),
        }
    }
}

/// A pooled connection to one external database.
///
/// Implementations acquire a pooled connection per call and release it on every
/// exit path (RAII guards), and must be shareable across request tasks.
#[async_trait]
pub trait DbTarget: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Returns the logical target name (`sica`, `tracking`, ...).
    fn target_name(&self) -> &'static str;

    // Execute one statement and collect the first result set.
    async fn fetch(&self, statement: &Statement) -> DbResult<Vec<Record>>;

    // Round trip a trivial query to check the pool can reach the server.
    async fn ping(&self) -> DbResult<()>;
}

/// Checks that a procedure name is a plain, optionally schema-qualified identifier.
pub fn check_procedure_name(name: &str) -> DbResult<()> {
    let valid = !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidStatement(format!(
            "procedure name is not a plain identifier: {name}"
        )))
    }
}

/// Comma-separated placeholders, numbered from 1 by `make`.
pub fn placeholders(count: usize, make: impl Fn(usize) -> String) -> String {
    (1..=count).map(make).collect::<Vec<_>>().join(", ")
}
