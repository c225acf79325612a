//! Configuration for the pgops server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (listen address, database, access mode, logging)
//! 2. .env file - secrets (the connection string)
//!
//! Environment variables always override config.yaml values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}

/// MCP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// What the tools may do to the database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    Unrestricted,
    /// Every statement runs in a read-only transaction
    Restricted,
}

impl std::str::FromStr for AccessMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "restricted" => Ok(Self::Restricted),
            _ => Err(()),
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// libpq-style connection string or URL
    pub url: String,

    /// Applied with `SET statement_timeout` after connecting
    pub statement_timeout_ms: Option<u64>,

    pub access_mode: AccessMode,
}

impl DatabaseConfig {
    /// Restricted sessions fall back to 30s when no timeout is configured
    pub fn effective_statement_timeout_ms(&self) -> Option<u64> {
        match (self.statement_timeout_ms, self.access_mode) {
            (Some(timeout), _) => Some(timeout),
            (None, AccessMode::Restricted) => Some(30_000),
            (None, AccessMode::Unrestricted) => None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://postgres@localhost:5432/postgres".to_string(),
            statement_timeout_ms: None,
            access_mode: AccessMode::Unrestricted,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stderr, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stderr".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides.
    /// A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("PGOPS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PGOPS_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "PGOPS_SERVER_PORT".to_string(),
                value: port.clone(),
            })?;
        }

        if let Ok(url) = std::env::var("DATABASE_URI") {
            self.database.url = url;
        }
        if let Ok(timeout) = std::env::var("PGOPS_STATEMENT_TIMEOUT_MS") {
            let parsed = timeout.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "PGOPS_STATEMENT_TIMEOUT_MS".to_string(),
                value: timeout.clone(),
            })?;
            self.database.statement_timeout_ms = Some(parsed);
        }
        if let Ok(mode) = std::env::var("PGOPS_ACCESS_MODE") {
            self.database.access_mode = mode.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "PGOPS_ACCESS_MODE".to_string(),
                value: mode.clone(),
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }

        Ok(())
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "postgresql://postgres@localhost:5432/postgres");
        assert_eq!(config.database.statement_timeout_ms, None);
        assert_eq!(config.database.access_mode, AccessMode::Unrestricted);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stderr");
    }

    // Env overrides share process state, so they live in one test
    #[test]
    fn test_file_and_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  port: 9090
database:
  url: "postgresql://app@db:5432/app"
  statement_timeout_ms: 5000
  access_mode: restricted
logging:
  format: "json"
"#
        )
        .unwrap();

        std::env::remove_var("DATABASE_URI");
        std::env::remove_var("PGOPS_STATEMENT_TIMEOUT_MS");
        std::env::remove_var("LOG_FORMAT");
        std::env::remove_var("PGOPS_SERVER_HOST");
        std::env::remove_var("PGOPS_SERVER_PORT");
        std::env::remove_var("PGOPS_ACCESS_MODE");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "postgresql://app@db:5432/app");
        assert_eq!(config.database.statement_timeout_ms, Some(5000));
        assert_eq!(config.database.access_mode, AccessMode::Restricted);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.directory, "./logs");

        std::env::set_var("DATABASE_URI", "postgresql://override@db/other");
        std::env::set_var("PGOPS_STATEMENT_TIMEOUT_MS", "250");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.database.url, "postgresql://override@db/other");
        assert_eq!(config.database.statement_timeout_ms, Some(250));

        std::env::set_var("PGOPS_ACCESS_MODE", "Unrestricted");
        assert_eq!(Config::load(file.path()).unwrap().database.access_mode, AccessMode::Unrestricted);
        std::env::set_var("PGOPS_ACCESS_MODE", "read-only");
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::InvalidEnvVar { .. })
        ));
        std::env::remove_var("PGOPS_ACCESS_MODE");

        std::env::set_var("PGOPS_SERVER_PORT", "eighty");
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::InvalidEnvVar { .. })
        ));
        std::env::remove_var("PGOPS_SERVER_PORT");

        std::env::set_var("PGOPS_STATEMENT_TIMEOUT_MS", "soon");
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::InvalidEnvVar { .. })
        ));

        std::env::remove_var("DATABASE_URI");
        std::env::remove_var("PGOPS_STATEMENT_TIMEOUT_MS");
    }

    #[test]
    fn test_restricted_mode_gets_a_timeout() {
        let mut database = DatabaseConfig::default();
        assert_eq!(database.effective_statement_timeout_ms(), None);

        database.access_mode = AccessMode::Restricted;
        assert_eq!(database.effective_statement_timeout_ms(), Some(30_000));

        database.statement_timeout_ms = Some(500);
        assert_eq!(database.effective_statement_timeout_ms(), Some(500));
    }

    #[test]
    fn test_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "database: [not, a, map").unwrap();

        assert!(matches!(Config::load(file.path()), Err(ConfigError::Yaml(_))));
    }
}
