/*
 * Responsibility
 * - 環境変数や設定の読み込み (listen addr, CORS 許可, Auth 設定, DB target ごとの接続情報)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - secret は Debug に出さない
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which engine a database target speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    SqlServer,
    MySql,
    Postgres,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::SqlServer => "mssql",
            Backend::MySql => "mysql",
            Backend::Postgres => "postgres",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Backend::SqlServer => 1433,
            Backend::MySql => 3306,
            Backend::Postgres => 5432,
        }
    }
}

/// Connection settings for one database target (`SICA_DB_*`, `TRACKING_DB_*`, ...).
#[derive(Clone)]
pub struct DbTargetConfig {
    pub name: &'static str,
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_max: u32,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
    pub connect_retries: u32,
    // SQL Server only
    pub trust_cert: bool,
}

impl fmt::Debug for DbTargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the password
        f.debug_struct("DbTargetConfig")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("pool_max", &self.pool_max)
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .field("connect_retries", &self.connect_retries)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

impl DbTargetConfig {
    fn from_source(
        source: &impl Fn(&str) -> Option<String>,
        name: &'static str,
        prefix: &str,
        backend: Backend,
    ) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{prefix}_DB_{suffix}");

        let host = required(source, &key("HOST"))?;
        let port = parse_or(source, &key("PORT"), backend.default_port())?;
        let user = required(source, &key("USER"))?;
        let password = required(source, &key("PASSWORD"))?;
        let database = required(source, &key("NAME"))?;

        let pool_max: u32 = parse_or(source, &key("POOL_MAX"), 10)?;
        if pool_max == 0 {
            return Err(ConfigError::Invalid(key("POOL_MAX")));
        }

        let connect_timeout = seconds_or(source, &key("CONNECT_TIMEOUT_SECONDS"), 15)?;
        let query_timeout = seconds_or(source, &key("QUERY_TIMEOUT_SECONDS"), 60)?;
        let connect_retries = parse_or(source, &key("CONNECT_RETRIES"), 2)?;
        let trust_cert = parse_or(source, &key("TRUST_CERT"), false)?;

        Ok(Self {
            name,
            backend,
            host,
            port,
            user,
            password,
            database,
            pool_max,
            connect_timeout,
            query_timeout,
            connect_retries,
            trust_cert,
        })
    }
}

/// Bearer verification parameters.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithms", &self.algorithms)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub http_request_timeout: Duration,
    pub http_body_limit_bytes: usize,

    pub auth: AuthConfig,

    pub sica_db: DbTargetConfig,
    pub accounting_db: DbTargetConfig,
    pub tracking_db: DbTargetConfig,
    pub warehouse_db: DbTargetConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&source, "PORT", 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT".to_string()))?;

        let app_env = source("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let cors_allowed_origins = source("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let http_request_timeout = seconds_or(&source, "HTTP_REQUEST_TIMEOUT_SECONDS", 30)?;
        let http_body_limit_bytes = parse_or(&source, "HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let auth = AuthConfig {
            jwt_secret: required(&source, "AUTH_JWT_SECRET")?,
            issuer: required(&source, "AUTH_ISSUER")?,
            audience: required(&source, "AUTH_AUDIENCE")?,
            algorithms: parse_algorithms(source("AUTH_ALGORITHMS").as_deref())?,
            leeway_seconds: parse_or(&source, "ACCESS_TOKEN_LEEWAY_SECONDS", 30)?,
        };

        let sica_db = DbTargetConfig::from_source(&source, "sica", "SICA", Backend::SqlServer)?;
        let accounting_db =
            DbTargetConfig::from_source(&source, "accounting", "ACCOUNTING", Backend::SqlServer)?;
        let tracking_db =
            DbTargetConfig::from_source(&source, "tracking", "TRACKING", Backend::MySql)?;
        let warehouse_db =
            DbTargetConfig::from_source(&source, "warehouse", "WAREHOUSE", Backend::Postgres)?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            http_request_timeout,
            http_body_limit_bytes,
            auth,
            sica_db,
            accounting_db,
            tracking_db,
            warehouse_db,
        })
    }
}

fn required(source: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    source(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

// Missing keys fall back to the default; present but unparsable keys fail startup.
fn parse_or<T: FromStr>(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match source(key) {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key.to_string())),
    }
}

fn seconds_or(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(source, key, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid(key.to_string()));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_algorithms(value: Option<&str>) -> Result<Vec<Algorithm>, ConfigError> {
    let invalid = || ConfigError::Invalid("AUTH_ALGORITHMS".to_string());

    let algorithms = value
        .unwrap_or("HS256")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Algorithm::from_str(s).map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    // Only shared-secret algorithms make sense with AUTH_JWT_SECRET
    if algorithms.is_empty()
        || algorithms
            .iter()
            .any(|a| !matches!(a, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
    {
        return Err(invalid());
    }

    Ok(algorithms)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_env() -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("AUTH_JWT_SECRET".into(), "s3cret".into());
        env.insert("AUTH_ISSUER".into(), "https://auth.example.test".into());
        env.insert("AUTH_AUDIENCE".into(), "customs-reports".into());
        for prefix in ["SICA", "ACCOUNTING", "TRACKING", "WAREHOUSE"] {
            env.insert(format!("{prefix}_DB_HOST"), "db.internal".into());
            env.insert(format!("{prefix}_DB_USER"), "reporter".into());
            env.insert(format!("{prefix}_DB_PASSWORD"), "hunter2".into());
            env.insert(format!("{prefix}_DB_NAME"), prefix.to_lowercase());
        }
        env
    }

    fn load(env: &HashMap<String, String>) -> Result<Config, ConfigError> {
        Config::from_source(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_are_applied() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.http_request_timeout, Duration::from_secs(30));
        assert_eq!(config.auth.algorithms, vec![Algorithm::HS256]);
        assert_eq!(config.auth.leeway_seconds, 30);
        assert_eq!(config.sica_db.port, 1433);
        assert_eq!(config.tracking_db.port, 3306);
        assert_eq!(config.warehouse_db.port, 5432);
        assert_eq!(config.warehouse_db.backend, Backend::Postgres);
        assert_eq!(config.sica_db.query_timeout, Duration::from_secs(60));
    }

    #[test]
    fn missing_required_key_is_named() {
        let mut env = base_env();
        env.remove("TRACKING_DB_PASSWORD");

        let err = load(&env).unwrap_err();
        assert_eq!(err, ConfigError::Missing("TRACKING_DB_PASSWORD".into()));
    }

    #[test]
    fn unparsable_value_is_invalid() {
        let mut env = base_env();
        env.insert("SICA_DB_QUERY_TIMEOUT_SECONDS".into(), "soon".into());

        let err = load(&env).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("SICA_DB_QUERY_TIMEOUT_SECONDS".into()));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut env = base_env();
        env.insert("WAREHOUSE_DB_CONNECT_TIMEOUT_SECONDS".into(), "0".into());

        assert!(load(&env).is_err());
    }

    #[test]
    fn asymmetric_algorithms_are_rejected() {
        let mut env = base_env();
        env.insert("AUTH_ALGORITHMS".into(), "HS256,RS256".into());

        let err = load(&env).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("AUTH_ALGORITHMS".into()));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = load(&base_env()).unwrap();
        let printed = format!("{config:?}");

        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn production_env_is_recognized() {
        assert!(AppEnv::parse("PROD").is_production());
        assert!(!AppEnv::parse("staging").is_production());
    }
}
