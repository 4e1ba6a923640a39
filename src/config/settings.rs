//! Application settings loading from zarzify.toml and the environment.
//!
//! Settings come from an optional TOML file (`zarzify.toml`, or the path in
//! `ZARZIFY_CONFIG`). Every section has defaults, so a missing file is not an
//! error. Environment variables are applied last and win over the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "zarzify.toml";

/// Top-level settings structure representing the whole zarzify.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Document store connection
    pub documents: StoreConfig,
    /// Relational store connection
    pub relational: StoreConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Whether 500 responses carry the raw error message in `details`
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            expose_error_details: true,
        }
    }
}

/// Connection settings for one store. `url` is a SeaORM connection string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection string; `None` uses the built-in default
    pub url: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Socket address string for the HTTP listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Parses settings from a TOML string.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })
}

/// Loads settings from a TOML file. A missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        tracing::debug!("No settings file at {:?}, using defaults", path_ref);
        return Ok(AppConfig::default());
    }

    tracing::debug!("Loading settings from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Resolves the settings path: explicit argument, then `ZARZIFY_CONFIG`, then the default.
#[must_use]
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var("ZARZIFY_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Applies environment overrides on top of file settings.
///
/// Reads `DOCUMENTS_DATABASE_URL`, `DATABASE_URL`, `ZARZIFY_HOST` and `ZARZIFY_PORT`.
///
/// # Errors
/// Returns an error if `ZARZIFY_PORT` is set but not a valid port number.
pub fn apply_env_overrides(mut config: AppConfig) -> Result<AppConfig> {
    if let Ok(url) = std::env::var("DOCUMENTS_DATABASE_URL") {
        config.documents.url = Some(url);
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.relational.url = Some(url);
    }
    if let Ok(host) = std::env::var("ZARZIFY_HOST") {
        config.server.host = host;
    }
    if let Ok(port) = std::env::var("ZARZIFY_PORT") {
        config.server.port = port.trim().parse().map_err(|e| Error::Config {
            message: format!("ZARZIFY_PORT is not a valid port ({port}): {e}"),
        })?;
    }
    Ok(config)
}

/// Loads the full application configuration: file, then environment.
///
/// # Errors
/// Returns an error if the settings file is invalid or an override cannot be parsed.
pub fn load_app_configuration(explicit: Option<PathBuf>) -> Result<AppConfig> {
    let path = resolve_config_path(explicit);
    let config = load_config(&path)?;
    apply_env_overrides(config)
}
