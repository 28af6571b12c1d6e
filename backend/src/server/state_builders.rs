//! Builders for HTTP state and the repository behind it.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use crate::domain::UserService;
use crate::domain::ports::UserRepository;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryUserRepository;
use crate::outbound::persistence::{DbPool, DieselUserRepository, PoolError};
use crate::settings::{DatabaseEngine, DatabaseSettings, SettingsError};

/// Failures while preparing the persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Database settings are unusable.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The connection pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

fn service_state<R>(repository: Arc<R>, clock: Arc<dyn Clock>) -> HttpState
where
    R: UserRepository + 'static,
{
    let service = Arc::new(UserService::new(repository, clock));
    HttpState::new(service.clone(), service)
}

/// Build handler state over PostgreSQL when a pool is available, otherwise
/// over a fresh in-memory repository.
#[must_use]
pub fn build_http_state(db_pool: Option<&DbPool>) -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    match db_pool {
        Some(pool) => service_state(Arc::new(DieselUserRepository::new(pool.clone())), clock),
        None => service_state(Arc::new(InMemoryUserRepository::default()), clock),
    }
}

/// Open the connection pool the settings ask for.
///
/// Returns `None` for the in-memory engine.
///
/// # Errors
/// Returns [`StartupError::Settings`] for an unsupported engine or invalid
/// connection options and [`StartupError::Pool`] when the pool cannot be
/// built.
pub async fn connect_database(
    settings: &DatabaseSettings,
) -> Result<Option<DbPool>, StartupError> {
    match settings.engine()? {
        DatabaseEngine::Memory => {
            info!("using in-memory user repository");
            Ok(None)
        }
        DatabaseEngine::Postgres => {
            let config = settings.pool_config()?;
            info!(pool = ?config, "connecting to PostgreSQL");
            Ok(Some(DbPool::new(config).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use env_lock::lock_env;
    use std::ffi::OsString;

    use ortho_config::OrthoConfig;
    use rstest::rstest;

    use super::*;

    fn database_settings(engine: Option<&str>) -> DatabaseSettings {
        let _guard = lock_env([
            ("DB_ENGINE", engine.map(str::to_owned)),
            ("DB_HOST", None),
        ]);
        DatabaseSettings::load_from_iter([OsString::from("user-service")])
            .expect("settings load")
    }

    #[tokio::test]
    async fn memory_engine_needs_no_pool() {
        let settings = database_settings(Some("memory"));
        let pool = connect_database(&settings).await.expect("memory engine");
        assert!(pool.is_none());
    }

    #[tokio::test]
    async fn unsupported_engine_is_rejected() {
        let settings = database_settings(Some("mysql"));
        match connect_database(&settings).await {
            Err(err) => assert_eq!(err.to_string(), "Unsupported database type: mysql"),
            Ok(_) => panic!("unsupported engine should be rejected"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn memory_state_serves_lookups() {
        let state = build_http_state(None);
        let page = state
            .users_query
            .list_users(crate::domain::ListUsersRequest::default())
            .await
            .expect("listing succeeds");
        assert!(page.is_empty());
    }
}
