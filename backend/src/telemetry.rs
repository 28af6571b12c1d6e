//! Tracing subscriber setup.
//!
//! Every channel emits JSON records filtered by `LOG_LEVEL`. The `file` and
//! `tcp` channels only apply when `APP_ENVIRONMENT=local`; deployed
//! environments always log to stdout where the platform collects them.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cap_std::{ambient_authority, fs::Dir, fs::OpenOptions};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::settings::{AppSettings, LogChannel, LogSettings, SettingsError};

/// Failures while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Logging settings were invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The log file could not be opened.
    #[error("failed to open log file {path}: {source}")]
    File {
        /// Requested log file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The TCP collector refused the connection.
    #[error("failed to connect to log collector at {addr}: {source}")]
    Connect {
        /// Collector address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// `LOG_LEVEL` is not a valid filter directive.
    #[error("invalid log level {level:?}: {message}")]
    Filter {
        /// Raw directive.
        level: String,
        /// Parser message.
        message: String,
    },
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Channel that applies in the configured environment.
///
/// # Errors
/// Returns [`SettingsError::UnsupportedLogChannel`] for an unknown channel
/// name in the local environment.
pub fn effective_channel(
    app: &AppSettings,
    log: &LogSettings,
) -> Result<LogChannel, SettingsError> {
    if app.is_local() {
        log.channel()
    } else {
        Ok(LogChannel::Console)
    }
}

fn open_log_file(path: &Path) -> io::Result<std::fs::File> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;

    Dir::create_ambient_dir_all(parent, ambient_authority())?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    Ok(dir.open_with(file_name, &options)?.into_std())
}

/// Build the writer for `channel`.
///
/// # Errors
/// Returns [`TelemetryError::File`] or [`TelemetryError::Connect`] when the
/// destination cannot be opened.
pub fn make_writer(channel: LogChannel, log: &LogSettings) -> Result<BoxMakeWriter, TelemetryError> {
    match channel {
        LogChannel::Console => Ok(BoxMakeWriter::new(io::stdout)),
        LogChannel::File => {
            let path = log.file();
            let file = open_log_file(&path).map_err(|source| TelemetryError::File {
                path: path.clone(),
                source,
            })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        LogChannel::Tcp => {
            let addr = log.tcp_addr()?;
            let stream = TcpStream::connect(addr)
                .map_err(|source| TelemetryError::Connect { addr, source })?;
            Ok(BoxMakeWriter::new(Mutex::new(stream)))
        }
    }
}

/// Install the global JSON subscriber.
///
/// # Errors
/// Returns [`TelemetryError`] when the settings are invalid, the channel
/// cannot be opened, or a subscriber is already installed.
pub fn init(app: &AppSettings, log: &LogSettings) -> Result<LogChannel, TelemetryError> {
    let channel = effective_channel(app, log)?;
    let filter = EnvFilter::try_new(log.level()).map_err(|err| TelemetryError::Filter {
        level: log.level().to_owned(),
        message: err.to_string(),
    })?;
    let writer = make_writer(channel, log)?;

    tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))?;
    Ok(channel)
}
