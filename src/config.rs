//! Service configuration loader - parses climate.toml
//!
//! Keeps the dataset location and server settings out of the code so the
//! same binary can be pointed at a different SQLite file or port without
//! recompiling. Environment variables (optionally from `.env`) override the
//! file; command-line flags in `main` override both.

use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "climate.toml";

/// Environment file read at startup, before logging is installed.
pub const DEFAULT_ENV_PATH: &str = ".env";

/// Overrides `database.path`.
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";
/// Overrides `server.port`.
pub const ENV_PORT: &str = "CLIMATE_PORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

/// Location and pooling of the read-only dataset
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "Resources/hawaii.sqlite".to_string(),
            max_connections: 4,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of request worker threads.
    pub workers: usize,
    /// HTML served at `/`.
    pub landing_page: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            workers: 4,
            landing_page: "templates/index.html".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ServiceConfig {
    /// Parses a configuration document.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`. A missing file yields the defaults;
    /// an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Loads the configuration file, then applies environment overrides.
    /// `.env` must already have been loaded with `load_env_file`.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(
            env::var(ENV_DATABASE_PATH).ok(),
            env::var(ENV_PORT).ok(),
        )?;
        Ok(config)
    }

    /// Applies override values as read from the environment.
    pub fn apply_overrides(
        &mut self,
        database_path: Option<String>,
        port: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = database_path.filter(|p| !p.trim().is_empty()) {
            self.database.path = path;
        }

        if let Some(port) = port {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PORT.to_string(),
                value: port.clone(),
            })?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid("server.workers must be at least 1".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }
        Ok(())
    }
}

/// Loads variables from an env file into the process environment. Variables
/// already set are left alone. Returns whether the file was read.
pub fn load_env_file(path: &Path) -> bool {
    dotenv::from_path(path).is_ok()
}
