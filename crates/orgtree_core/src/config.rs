//! Runtime configuration resolved from `ORGTREE_*` environment variables.
//!
//! Blank values fall back to defaults. Malformed numbers are errors.

use crate::db::{DbOptions, DEFAULT_BUSY_TIMEOUT};
use crate::logging::{default_log_level, LoggingConfig};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "ORGTREE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ORGTREE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ORGTREE_LOG_DIR";
pub const ENV_BUSY_TIMEOUT_MS: &str = "ORGTREE_BUSY_TIMEOUT_MS";
pub const ENV_LOG_STDERR: &str = "ORGTREE_LOG_STDERR";

const DEFAULT_DB_FILE_NAME: &str = "orgtree.sqlite3";

/// Malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} `{}`: {}", self.key, self.value, self.reason)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is off when `None`.
    pub log_dir: Option<PathBuf>,
    /// Duplicate warnings and errors to stderr while file logging runs.
    pub log_stderr: bool,
    pub busy_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            log_stderr: false,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(raw) = read(ENV_LOG_STDERR) {
            config.log_stderr = parse_switch(ENV_LOG_STDERR, &raw)?;
        }
        if let Some(raw) = read(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw.parse::<u64>().map_err(|_| ConfigError {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw.clone(),
                reason: "expected a non-negative integer of milliseconds",
            })?;
            config.busy_timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }

    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: self.busy_timeout,
        }
    }

    /// Logging settings, when a log directory is configured.
    pub fn logging(&self) -> Option<LoggingConfig> {
        self.log_dir.as_ref().map(|dir| LoggingConfig {
            duplicate_to_stderr: self.log_stderr,
            ..LoggingConfig::new(self.log_level.clone(), dir.clone())
        })
    }
}

fn parse_switch(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            key,
            value: raw.to_string(),
            reason: "expected one of 1|0|true|false|yes|no|on|off",
        }),
    }
}
