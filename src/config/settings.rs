//! Application settings loaded from config.toml
//!
//! Every section is optional: a missing file or a missing key falls back to the
//! defaults below, and `DATABASE_URL`, `BENEFIT_HOST` and `BENEFIT_PORT` from the
//! environment (or `.env`) override whatever the file says.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_VAR: &str = "BENEFIT_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Benefits to create when the table is empty
    #[serde(default)]
    pub benefits: Vec<SeedBenefit>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Storage settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL
    pub url: String,
    /// Pool size; the `SQLite` driver uses a single connection when unset
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: None,
        }
    }
}

/// A benefit to seed on first run
#[derive(Debug, Clone, Deserialize)]
pub struct SeedBenefit {
    /// Name of the benefit
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Initial value
    pub value: Decimal,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `BENEFIT_CONFIG` (default `./config.toml`), using
/// defaults when the file does not exist, then applies environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());

    let mut config = if Path::new(&path).exists() {
        let config = load_config(&path)?;
        info!("Loaded configuration from {path}");
        config
    } else {
        info!("No configuration file at {path}, using defaults");
        AppConfig::default()
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

impl AppConfig {
    /// Applies `DATABASE_URL`, `BENEFIT_HOST` and `BENEFIT_PORT` through `lookup`.
    ///
    /// # Errors
    /// Returns an error if `BENEFIT_PORT` is not a valid port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(host) = lookup("BENEFIT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BENEFIT_PORT") {
            self.server.port = port.parse().map_err(|e| Error::Config {
                message: format!("Invalid BENEFIT_PORT '{port}': {e}"),
            })?;
        }
        Ok(())
    }
}
