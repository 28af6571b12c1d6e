//! Log level and output channel.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use super::SettingsError;

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_FILE: &str = "logs/app.log";
const DEFAULT_TCP_ADDR: &str = "127.0.0.1:5170";

/// Where log records are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogChannel {
    /// JSON lines on stdout.
    #[default]
    Console,
    /// JSON lines appended to a file.
    File,
    /// JSON lines streamed over TCP.
    Tcp,
}

impl FromStr for LogChannel {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "console" | "stdout" => Ok(Self::Console),
            "file" => Ok(Self::File),
            "tcp" => Ok(Self::Tcp),
            other => Err(SettingsError::UnsupportedLogChannel(other.to_owned())),
        }
    }
}

/// Logging settings read from `LOG_*` variables.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOG")]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `user_service=debug`.
    #[ortho_config(default = DEFAULT_LEVEL.to_owned())]
    pub level: String,
    /// Output channel name.
    pub channel: Option<String>,
    /// Log file used by the `file` channel.
    pub file: Option<PathBuf>,
    /// Collector address used by the `tcp` channel.
    pub tcp_addr: Option<String>,
}

impl LogSettings {
    /// Filter directive; blank values fall back to `info`.
    #[must_use]
    pub fn level(&self) -> &str {
        match self.level.trim() {
            "" => DEFAULT_LEVEL,
            level => level,
        }
    }

    /// Parsed output channel.
    ///
    /// # Errors
    /// Returns [`SettingsError::UnsupportedLogChannel`] for unknown names.
    pub fn channel(&self) -> Result<LogChannel, SettingsError> {
        self.channel
            .as_deref()
            .map_or(Ok(LogChannel::Console), str::parse)
    }

    /// Log file path, falling back to `logs/app.log`.
    #[must_use]
    pub fn file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE))
    }

    /// Parsed TCP collector address.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidAddress`] when `LOG_TCP_ADDR` is not a
    /// socket address.
    pub fn tcp_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.tcp_addr.as_deref().unwrap_or(DEFAULT_TCP_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| {
            SettingsError::InvalidAddress {
                setting: "LOG_TCP_ADDR",
                value: raw.to_owned(),
                message: err.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load(channel: Option<&str>, file: Option<&str>) -> LogSettings {
        let _guard = lock_env([
            ("LOG_LEVEL", None::<String>),
            ("LOG_CHANNEL", channel.map(str::to_owned)),
            ("LOG_FILE", file.map(str::to_owned)),
            ("LOG_TCP_ADDR", None::<String>),
        ]);
        LogSettings::load_from_iter([OsString::from("user-service")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let settings = load(None, None);
        assert_eq!(settings.level(), "info");
        assert_eq!(settings.channel().expect("default channel"), LogChannel::Console);
        assert_eq!(settings.file(), PathBuf::from("logs/app.log"));
        assert_eq!(settings.tcp_addr().expect("default address").port(), 5170);
    }

    #[rstest]
    #[case("file", LogChannel::File)]
    #[case("TCP", LogChannel::Tcp)]
    #[case("console", LogChannel::Console)]
    fn channel_names_parse(#[case] raw: &str, #[case] expected: LogChannel) {
        let settings = load(Some(raw), Some("/var/log/users.log"));
        assert_eq!(settings.channel().expect("known channel"), expected);
        assert_eq!(settings.file(), PathBuf::from("/var/log/users.log"));
    }

    #[rstest]
    fn unknown_channel_is_rejected() {
        let settings = load(Some("syslog"), None);
        assert_eq!(
            settings.channel(),
            Err(SettingsError::UnsupportedLogChannel("syslog".to_owned()))
        );
    }
}
