//! Service identity and HTTP options.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};

use super::SettingsError;

const DEFAULT_NAME: &str = "user-service";
const DEFAULT_ENVIRONMENT: &str = "local";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// The environment layer splits comma-separated values into sequences.
#[derive(Deserialize)]
#[serde(untagged)]
enum OriginList {
    Joined(String),
    Split(Vec<String>),
}

fn origin_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<OriginList>::deserialize(deserializer)?.map(|origins| match origins {
            OriginList::Joined(raw) => raw,
            OriginList::Split(parts) => parts.join(","),
        }),
    )
}

/// Application settings read from `APP_*` variables.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "APP")]
pub struct AppSettings {
    /// Service name reported in logs and the OpenAPI document.
    pub name: Option<String>,
    /// Deployment environment: `local`, `dev`, `uat` or `prod`.
    pub environment: Option<String>,
    /// Enable debug behaviour such as payload logging.
    #[ortho_config(default = false)]
    pub debug: bool,
    /// Comma-separated CORS origins; `*` allows any origin.
    #[serde(default, deserialize_with = "origin_list")]
    pub allowed_origins: Option<String>,
    /// Socket address for the HTTP server.
    pub bind_addr: Option<String>,
}

impl AppSettings {
    /// Return the configured name, falling back to `user-service`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    /// Return the configured environment, falling back to `local`.
    #[must_use]
    pub fn environment(&self) -> &str {
        self.environment
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// Whether the service runs on a developer machine.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.environment() == DEFAULT_ENVIRONMENT
    }

    /// Path prefix the API Gateway stage adds in front of every route.
    #[must_use]
    pub fn root_path(&self) -> &'static str {
        match self.environment() {
            "dev" => "/dev/",
            "uat" => "/uat/",
            "prod" => "/prod/",
            _ => "/",
        }
    }

    /// Allowed CORS origins with blanks removed; defaults to `["*"]`.
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .allowed_origins
            .as_deref()
            .unwrap_or("*")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();
        if origins.is_empty() {
            vec!["*".to_owned()]
        } else {
            origins
        }
    }

    /// Parsed bind address.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidAddress`] when `APP_BIND_ADDR` is not
    /// a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| {
            SettingsError::InvalidAddress {
                setting: "APP_BIND_ADDR",
                value: raw.to_owned(),
                message: err.to_string(),
            }
        })
    }
}
