//! Configuration loading and config file resolution
//!
//! Priority order (highest first):
//! 1. Command-line arguments / environment variables (applied by each binary)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing config file is not fatal: the service logs a warning and
//! starts on compiled defaults. A config file that was named explicitly
//! must exist and parse.

use crate::{Error, Result};
use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Relational store connection settings
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// MySQL connection settings
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_host")]
    pub host: String,

    #[serde(default = "default_store_port")]
    pub port: u16,

    #[serde(default = "default_store_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Database (schema) holding the `traffic_stops` table
    #[serde(default = "default_store_database")]
    pub database: String,

    /// Upper bound on establishing one connection
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Create the `traffic_stops` table at startup if it is missing
    #[serde(default)]
    pub init_schema: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_store_host() -> String {
    "localhost".to_string()
}

fn default_store_port() -> u16 {
    3307
}

fn default_store_user() -> String {
    "root".to_string()
}

fn default_store_database() -> String {
    "securecheck".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8501
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_store_host(),
            port: default_store_port(),
            user: default_store_user(),
            password: String::new(),
            database: default_store_database(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_server_port(),
            init_schema: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Password is never written to logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl StoreConfig {
    /// Build sqlx connect options for one scoped connection
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Human-readable target for log lines (no credentials)
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl TomlConfig {
    /// Load configuration
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// locations are searched and compiled defaults are used when none exists.
    ///
    /// Not validated here: command-line and environment overrides are applied
    /// on top of the loaded file, so call [`TomlConfig::validate`] after them.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match explicit_path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Reject values no connection could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.store.host.is_empty() {
            return Err(Error::Config("store.host must not be empty".to_string()));
        }
        if self.store.database.is_empty() {
            return Err(Error::Config("store.database must not be empty".to_string()));
        }
        if self.store.connect_timeout_secs == 0 {
            return Err(Error::Config(
                "store.connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Locate the config file for the platform
///
/// Checks the user config directory (`~/.config/securecheck/config.toml` on
/// Linux) first, then `/etc/securecheck/config.toml` on Unix.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("securecheck").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/securecheck/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
