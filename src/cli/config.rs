//! Service configuration
//!
//! A JSON file where every field is optional, then `IIDY_HOST`, `IIDY_PORT`
//! and `IIDY_DB_PATH` from the environment, then command line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::DatabaseConfig;
use crate::http_server::config::DEFAULT_MAX_BODY_BYTES;
use crate::http_server::HttpServerConfig;
use crate::observability::Severity;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Interface to bind (default "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (default 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file (default "./iidy.db")
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Pooled connections (default 5)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Longest wait for a pooled connection
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Deadline for a single store operation
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,

    /// Longest wait on a lock held by another connection
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Request body limit in bytes (default 64 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Minimum log severity: trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_db_path() -> PathBuf {
    PathBuf::from("./iidy.db")
}
fn default_pool_size() -> usize {
    5
}
fn default_acquire_timeout_ms() -> u64 {
    5_000
}
fn default_op_timeout_ms() -> u64 {
    30_000
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}
fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            pool_size: default_pool_size(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            op_timeout_ms: default_op_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without validating it
    pub fn from_file(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Override fields from `IIDY_*` variables
    pub fn apply_env<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("IIDY_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("IIDY_PORT") {
            self.port = port
                .parse()
                .map_err(|e| CliError::config_error(format!("Invalid IIDY_PORT '{}': {}", port, e)))?;
        }
        if let Some(db_path) = lookup("IIDY_DB_PATH") {
            self.db_path = PathBuf::from(db_path);
        }
        Ok(())
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> CliResult<()> {
        if self.pool_size == 0 {
            return Err(CliError::config_error("pool_size must be > 0"));
        }
        if self.acquire_timeout_ms == 0 {
            return Err(CliError::config_error("acquire_timeout_ms must be > 0"));
        }
        if self.op_timeout_ms == 0 {
            return Err(CliError::config_error("op_timeout_ms must be > 0"));
        }
        if self.busy_timeout_ms == 0 {
            return Err(CliError::config_error("busy_timeout_ms must be > 0"));
        }
        if self.max_body_bytes == 0 {
            return Err(CliError::config_error("max_body_bytes must be > 0"));
        }
        self.severity()?;
        Ok(())
    }

    /// Minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: self.db_path.clone(),
            pool_size: self.pool_size,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    pub fn to_http_config(&self) -> HttpServerConfig {
        HttpServerConfig {
            host: self.host.clone(),
            port: self.port,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.to_http_config().socket_addr(), "0.0.0.0:8080");
        assert_eq!(config.db_path, PathBuf::from("./iidy.db"));
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.op_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 9001, "pool_size": 2}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_body_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert_eq!(err.code_str(), "IIDY_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("IIDY_HOST", "127.0.0.1"),
                ("IIDY_PORT", "7000"),
                ("IIDY_DB_PATH", "/tmp/lists.db"),
            ]))
            .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/lists.db"));
    }

    #[test]
    fn test_bad_env_port() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("IIDY_PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let config = Config {
            pool_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            op_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            busy_timeout_ms: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("busy_timeout_ms"));

        let config = Config {
            log_level: "loud".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conversions() {
        let config = Config {
            busy_timeout_ms: 250,
            ..Config::default()
        };
        let db = config.to_database_config();
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
        assert_eq!(db.pool_size, 5);

        let http = config.to_http_config();
        assert_eq!(http.port, 8080);
        assert_eq!(http.max_body_bytes, config.max_body_bytes);
    }
}
