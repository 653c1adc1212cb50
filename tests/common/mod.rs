//! Shared fixtures for router-level tests.
//!
//! - `Recording`: in-memory `DbTarget` that records every statement it receives
//! - `token(...)`: HS256 access token signed with the test secret
//! - `app(...)`: the real v1 router over recording targets
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use customs_reports::app;
use customs_reports::config::AuthConfig;
use customs_reports::services::auth::AuthService;
use customs_reports::services::db::client::Command;
use customs_reports::services::db::{
    BindValue, CallPolicy, DbError, DbResult, DbTarget, Record, ReportDb, Statement, Targets,
};
use customs_reports::state::AppState;

pub const SECRET: &str = "integration-test-secret";
pub const ISSUER: &str = "https://auth.customs.test";
pub const AUDIENCE: &str = "customs-reports";

/// What the target answers with.
pub enum Reply {
    Rows(Vec<Record>),
    Fail(fn() -> DbError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub command: Command,
    pub binds: Vec<BindValue>,
}

pub struct Recording {
    name: &'static str,
    backend: &'static str,
    reply: Mutex<Reply>,
    calls: Mutex<Vec<Call>>,
}

impl Recording {
    pub fn new(name: &'static str, backend: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            backend,
            reply: Mutex::new(Reply::Rows(Vec::new())),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn reply_with(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DbTarget for Recording {
    fn backend_name(&self) -> &'static str {
        self.backend
    }

    fn target_name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, statement: &Statement) -> DbResult<Vec<Record>> {
        self.calls.lock().unwrap().push(Call {
            command: statement.command(),
            binds: statement.binds().to_vec(),
        });
        match &*self.reply.lock().unwrap() {
            Reply::Rows(rows) => Ok(rows.clone()),
            Reply::Fail(make) => Err(make()),
        }
    }

    async fn ping(&self) -> DbResult<()> {
        match &*self.reply.lock().unwrap() {
            Reply::Rows(_) => Ok(()),
            Reply::Fail(make) => Err(make()),
        }
    }
}

pub struct Fixture {
    pub sica: Arc<Recording>,
    pub accounting: Arc<Recording>,
    pub tracking: Arc<Recording>,
    pub warehouse: Arc<Recording>,
    pub state: AppState,
}

fn policy() -> CallPolicy {
    CallPolicy {
        query_timeout: Duration::from_millis(500),
        max_retries: 2,
        retry_backoff: Duration::from_millis(1),
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: SECRET.to_string(),
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
        algorithms: vec![Algorithm::HS256],
        leeway_seconds: 30,
    }
}

pub fn fixture() -> Fixture {
    let sica = Recording::new("sica", "sqlserver");
    let accounting = Recording::new("accounting", "sqlserver");
    let tracking = Recording::new("tracking", "mysql");
    let warehouse = Recording::new("warehouse", "postgres");

    let targets = Targets {
        sica: ReportDb::new(sica.clone(), policy()),
        accounting: ReportDb::new(accounting.clone(), policy()),
        tracking: ReportDb::new(tracking.clone(), policy()),
        warehouse: ReportDb::new(warehouse.clone(), policy()),
    };
    let auth = Arc::new(AuthService::new(&auth_config()).unwrap());

    Fixture {
        sica,
        accounting,
        tracking,
        warehouse,
        state: AppState::new(auth, targets),
    }
}

impl Fixture {
    pub fn router(&self) -> Router {
        app::router(self.state.clone())
    }

    pub fn total_calls(&self) -> usize {
        self.sica.calls().len()
            + self.accounting.calls().len()
            + self.tracking.calls().len()
            + self.warehouse.calls().len()
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn claims(scope: &str) -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "broker-17",
        "exp": now() + 600,
        "iat": now(),
        "scope": scope,
    })
}

pub fn sign(claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn token(scope: &str) -> String {
    sign(&claims(scope))
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

pub async fn call(router: Router, req: Request<Body>) -> Response<Body> {
    router.oneshot(req).await.unwrap()
}

pub async fn json_of(res: Response<Body>) -> (StatusCode, Value) {
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
