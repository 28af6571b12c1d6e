//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use crate::outbound::persistence::DbPool;
use crate::settings::{AppSettings, SettingsError};

/// Builder-style configuration for creating the HTTP server.
#[derive(Clone)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) service_name: String,
    pub(crate) root_path: String,
    pub(crate) allowed_origins: Vec<String>,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Configuration serving on `bind_addr` with permissive CORS, no stage
    /// prefix and the in-memory repository.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            service_name: env!("CARGO_PKG_NAME").to_owned(),
            root_path: "/".to_owned(),
            allowed_origins: vec!["*".to_owned()],
            db_pool: None,
        }
    }

    /// Build a configuration from application settings.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidAddress`] when the bind address does
    /// not parse.
    pub fn from_settings(app: &AppSettings) -> Result<Self, SettingsError> {
        Ok(Self::new(app.bind_addr()?)
            .with_service_name(app.name())
            .with_root_path(app.root_path())
            .with_allowed_origins(app.allowed_origins()))
    }

    /// Name reported in request spans and on the landing page.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Stage prefix the deployment adds in front of every route.
    #[must_use]
    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = root_path.into();
        self
    }

    /// Origins allowed by CORS; `*` allows any origin.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Attach a database connection pool so users are stored in PostgreSQL.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Return the stage prefix.
    #[must_use]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }
}
