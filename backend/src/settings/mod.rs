//! Runtime configuration loaded via OrthoConfig.
//!
//! Each concern has its own environment prefix: `APP_` for the service,
//! `LOG_` for telemetry and `DB_` for persistence. Values may also come from
//! a configuration file discovered by OrthoConfig.

use std::ffi::OsString;

use ortho_config::OrthoConfig;

mod app;
mod database;
mod log;

pub use app::AppSettings;
pub use database::{DatabaseEngine, DatabaseSettings};
pub use log::{LogChannel, LogSettings};

/// Failures while loading or interpreting configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// OrthoConfig could not merge the configuration layers.
    #[error("failed to load {section} settings: {message}")]
    Load {
        /// Settings section being loaded.
        section: &'static str,
        /// Underlying failure.
        message: String,
    },
    /// `DB_ENGINE` names an engine this service cannot use.
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabase(String),
    /// `LOG_CHANNEL` is not one of `console`, `file`, or `tcp`.
    #[error("unsupported log channel: {0}")]
    UnsupportedLogChannel(String),
    /// The database connection options do not form a valid URL.
    #[error("invalid database connection settings: {0}")]
    InvalidDatabaseUrl(String),
    /// An address setting did not parse.
    #[error("invalid {setting} value {value:?}: {message}")]
    InvalidAddress {
        /// Setting name.
        setting: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        message: String,
    },
}

/// All settings sections used by the binaries.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Service identity, environment and HTTP options.
    pub app: AppSettings,
    /// Log level and channel.
    pub log: LogSettings,
    /// Database engine and connection options.
    pub database: DatabaseSettings,
}

impl Settings {
    /// Load every section from files and the environment.
    ///
    /// Command-line arguments are not consulted; `program` stands in for
    /// `argv[0]`.
    ///
    /// # Errors
    /// Returns [`SettingsError::Load`] when any section fails to load.
    pub fn load(program: &str) -> Result<Self, SettingsError> {
        let args = || [OsString::from(program)];
        Ok(Self {
            app: AppSettings::load_from_iter(args()).map_err(|err| SettingsError::Load {
                section: "app",
                message: err.to_string(),
            })?,
            log: LogSettings::load_from_iter(args()).map_err(|err| SettingsError::Load {
                section: "log",
                message: err.to_string(),
            })?,
            database: DatabaseSettings::load_from_iter(args()).map_err(|err| {
                SettingsError::Load {
                    section: "database",
                    message: err.to_string(),
                }
            })?,
        })
    }
}
