//! Database engine selection and PostgreSQL connection options.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::outbound::persistence::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_CONNECTIONS, PoolConfig,
};

use super::SettingsError;

const DEFAULT_PORT: u16 = 5432;

/// Storage backend selected by `DB_ENGINE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    /// PostgreSQL through the Diesel adapter.
    Postgres,
    /// Process-local storage; nothing persists across restarts.
    Memory,
}

/// Database settings read from `DB_*` variables.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DB")]
pub struct DatabaseSettings {
    /// `psql`, `postgres`, `postgresql` or `memory`.
    pub engine: Option<String>,
    /// Server host name.
    pub host: Option<String>,
    /// Server port; values that are not a port number fall back to 5432.
    #[serde(default, deserialize_with = "lenient_port")]
    pub port: Option<u16>,
    /// Database name.
    pub name: Option<String>,
    /// Login role.
    pub username: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// CA bundle enabling TLS.
    pub ssl_ca: Option<String>,
    /// Verify the server certificate and host name against `ssl_ca`.
    #[ortho_config(default = false)]
    pub ssl_verify_cert: bool,
    /// Pool size.
    pub max_connections: Option<u32>,
    /// Pool checkout timeout in seconds.
    pub connection_timeout_secs: Option<u64>,
}

/// Accept numeric or textual ports, discarding values that are not a port.
fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(i64),
        Text(String),
    }

    let raw = Option::<RawPort>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawPort::Number(number) => u16::try_from(number).ok(),
        RawPort::Text(text) => text.trim().parse().ok(),
    }))
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("ssl_ca", &self.ssl_ca)
            .field("ssl_verify_cert", &self.ssl_verify_cert)
            .field("max_connections", &self.max_connections)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl DatabaseSettings {
    /// Selected engine; unset or blank means [`DatabaseEngine::Memory`].
    ///
    /// # Errors
    /// Returns [`SettingsError::UnsupportedDatabase`] for any other name.
    pub fn engine(&self) -> Result<DatabaseEngine, SettingsError> {
        let Some(raw) = self.engine.as_deref().map(str::trim) else {
            return Ok(DatabaseEngine::Memory);
        };
        match raw.to_ascii_lowercase().as_str() {
            "" | "memory" => Ok(DatabaseEngine::Memory),
            "psql" | "postgres" | "postgresql" => Ok(DatabaseEngine::Postgres),
            _ => Err(SettingsError::UnsupportedDatabase(raw.to_owned())),
        }
    }

    /// Configured port, or 5432 when unset or unparsable.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// PostgreSQL connection URL built from the individual options.
    ///
    /// With `DB_SSL_CA` set the URL requests TLS: `verify-full` when
    /// `DB_SSL_VERIFY_CERT` is true, `require` otherwise.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidDatabaseUrl`] when a component cannot
    /// be encoded into the URL.
    pub fn database_url(&self) -> Result<String, SettingsError> {
        let invalid = |what: &str| SettingsError::InvalidDatabaseUrl(what.to_owned());

        let mut url = Url::parse("postgres://localhost")
            .map_err(|err| SettingsError::InvalidDatabaseUrl(err.to_string()))?;
        url.set_host(Some(self.host.as_deref().unwrap_or("localhost")))
            .map_err(|err| SettingsError::InvalidDatabaseUrl(format!("host: {err}")))?;
        url.set_port(Some(self.port()))
            .map_err(|()| invalid("port"))?;
        if let Some(username) = self.username.as_deref() {
            url.set_username(username)
                .map_err(|()| invalid("username"))?;
        }
        if let Some(password) = self.password.as_deref() {
            url.set_password(Some(password))
                .map_err(|()| invalid("password"))?;
        }
        url.set_path(self.name.as_deref().unwrap_or_default());
        if let Some(ca) = self.ssl_ca.as_deref() {
            let mode = if self.ssl_verify_cert {
                "verify-full"
            } else {
                "require"
            };
            url.query_pairs_mut()
                .append_pair("sslmode", mode)
                .append_pair("sslrootcert", ca);
        }
        Ok(url.into())
    }

    /// Pool configuration for the Diesel adapter.
    ///
    /// # Errors
    /// Propagates [`DatabaseSettings::database_url`] failures.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let timeout = self
            .connection_timeout_secs
            .map_or(DEFAULT_CONNECTION_TIMEOUT, Duration::from_secs);
        Ok(PoolConfig::new(self.database_url()?)
            .with_max_size(self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
            .with_connection_timeout(timeout))
    }
}
