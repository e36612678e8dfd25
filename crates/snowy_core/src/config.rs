//! Process configuration read from `SNOWY_*` environment variables.
//!
//! # Responsibility
//! - Collect storage and logging settings in one typed value.
//! - Reject malformed values instead of silently falling back.
//!
//! # Invariants
//! - Unset variables take documented defaults; set-but-invalid ones error.
//! - `append_max_attempts` is always at least 1.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::{default_log_level, normalize_level};
use crate::repo::document_repo::DEFAULT_APPEND_MAX_ATTEMPTS;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "SNOWY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SNOWY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SNOWY_LOG_DIR";
pub const ENV_APPEND_MAX_ATTEMPTS: &str = "SNOWY_APPEND_MAX_ATTEMPTS";
pub const ENV_BUSY_TIMEOUT_MS: &str = "SNOWY_BUSY_TIMEOUT_MS";

const DEFAULT_DB_FILE_NAME: &str = "snowy.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid configuration for {key}: `{value}` ({reason})")
            }
        }
    }
}

impl Error for ConfigError {}

/// Storage and logging settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// `None` leaves file logging disabled.
    pub log_dir: Option<PathBuf>,
    pub append_max_attempts: u32,
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            append_max_attempts: DEFAULT_APPEND_MAX_ATTEMPTS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, so callers and tests need not
    /// touch process-global environment state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = PathBuf::from(value);
        }

        if let Some(value) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = normalize_level(&value).map_err(|reason| {
                ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value: value.clone(),
                    reason,
                }
            })?;
        }

        if let Some(value) = non_blank(lookup(ENV_LOG_DIR)) {
            let path = PathBuf::from(&value);
            if !path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value,
                    reason: "must be an absolute path".to_string(),
                });
            }
            config.log_dir = Some(path);
        }

        if let Some(value) = non_blank(lookup(ENV_APPEND_MAX_ATTEMPTS)) {
            config.append_max_attempts = match value.parse::<u32>() {
                Ok(attempts) if attempts >= 1 => attempts,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_APPEND_MAX_ATTEMPTS,
                        value,
                        reason: "expected an integer >= 1".to_string(),
                    })
                }
            };
        }

        if let Some(value) = non_blank(lookup(ENV_BUSY_TIMEOUT_MS)) {
            let millis = value
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_BUSY_TIMEOUT_MS,
                    value: value.clone(),
                    reason: err.to_string(),
                })?;
            config.busy_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, StoreConfig, ENV_APPEND_MAX_ATTEMPTS, ENV_BUSY_TIMEOUT_MS, ENV_DB_PATH,
        ENV_LOG_DIR, ENV_LOG_LEVEL,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn load(pairs: &[(&str, &str)]) -> Result<StoreConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        StoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(load(&[]).unwrap(), StoreConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let log_dir = std::env::temp_dir().join("snowy-config-test");
        let config = load(&[
            (ENV_DB_PATH, "/var/lib/snowy/store.db"),
            (ENV_LOG_LEVEL, " WARNING "),
            (ENV_LOG_DIR, log_dir.to_str().unwrap()),
            (ENV_APPEND_MAX_ATTEMPTS, "7"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/snowy/store.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(log_dir));
        assert_eq!(config.append_max_attempts, 7);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = load(&[(ENV_APPEND_MAX_ATTEMPTS, "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_APPEND_MAX_ATTEMPTS,
                ..
            }
        ));
        assert!(load(&[(ENV_LOG_LEVEL, "verbose")]).is_err());
        assert!(load(&[(ENV_LOG_DIR, "relative/logs")]).is_err());
        assert!(load(&[(ENV_BUSY_TIMEOUT_MS, "-5")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[(ENV_DB_PATH, "   "), (ENV_LOG_LEVEL, "")]).unwrap();
        assert_eq!(config, StoreConfig::default());
    }
}
