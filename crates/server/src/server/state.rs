use std::sync::Arc;

use axum_extra::extract::cookie::Key;

use crate::auth::throttle::LoginThrottle;
use crate::auth::utils::derive_cookie_key;
use crate::config::AppConfig;
use crate::database::connection::DbConnection;
use crate::server::constants::LOGIN_ATTEMPTS_PER_MINUTE;
use crate::storage::r2::R2Storage;
use crate::storage::ObjectStorage;

pub struct AppState {
    pub config: AppConfig,
    pub db_connection: DbConnection,
    pub storage: Arc<dyn ObjectStorage>,
    pub session_key: Key,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    pub async fn try_init(config: &AppConfig) -> anyhow::Result<Self> {
        let db_connection = DbConnection::connect(&config.database).await?;
        db_connection.init_schema().await?;
        let storage = Arc::new(R2Storage::new(&config.storage).await);
        Ok(Self::new(config.clone(), db_connection, storage))
    }

    pub fn new(
        config: AppConfig,
        db_connection: DbConnection,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let session_key = derive_cookie_key(&config.session.secret);
        Self {
            config,
            db_connection,
            storage,
            session_key,
            login_throttle: LoginThrottle::per_minute(LOGIN_ATTEMPTS_PER_MINUTE),
        }
    }
}
