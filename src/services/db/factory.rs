/// Factory: build every database target from application `Config`.
use std::sync::Arc;

use crate::config::{Backend, Config, DbTargetConfig};
use crate::services::db::{
    CallPolicy, DbTarget, ReportDb, Targets, mssql::MssqlTarget, mysql::MySqlTarget,
    postgres::PostgresTarget,
};

fn build_target(config: &DbTargetConfig) -> ReportDb {
    let target: Arc<dyn DbTarget> = match config.backend {
        Backend::SqlServer => Arc::new(MssqlTarget::new(config)),
        Backend::MySql => Arc::new(MySqlTarget::new(config)),
        Backend::Postgres => Arc::new(PostgresTarget::new(config)),
    };

    tracing::info!(
        target_db = config.name,
        backend = config.backend.name(),
        host = %config.host,
        port = config.port,
        pool_max = config.pool_max,
        "database target configured"
    );

    ReportDb::new(target, CallPolicy::from_config(config))
}

// Pools are lazy: an unreachable database fails its own calls, not startup.
pub fn build_targets(config: &Config) -> Targets {
    Targets {
        sica: build_target(&config.sica_db),
        accounting: build_target(&config.accounting_db),
        tracking: build_target(&config.tracking_db),
        warehouse: build_target(&config.warehouse_db),
    }
}
