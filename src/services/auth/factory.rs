/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::AuthService;

pub fn build_auth_service(config: &Config) -> Result<Arc<AuthService>, String> {
    let auth = AuthService::new(&config.auth)?;

    Ok(Arc::new(auth))
}
