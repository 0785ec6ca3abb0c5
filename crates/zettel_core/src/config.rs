//! Runtime configuration sourced from the environment.
//!
//! # Responsibility
//! - Resolve database path, shared secret and logging settings.
//! - Honour a local `.env` file before reading process variables.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - A configured log directory is always absolute.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Environment variable names.
pub mod env_vars {
    pub const DB_PATH: &str = "ZETTEL_DB_PATH";
    pub const SECRET: &str = "ZETTEL_SECRET";
    pub const LOG_LEVEL: &str = "ZETTEL_LOG_LEVEL";
    pub const LOG_DIR: &str = "ZETTEL_LOG_DIR";
}

/// Default values.
pub mod defaults {
    pub const DB_PATH: &str = "z.db";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativeLogDir(value) => write!(
                f,
                "{} must be an absolute path, got `{value}`",
                env_vars::LOG_DIR
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZettelConfig {
    pub db_path: PathBuf,
    /// Local part expected on inbound-mail recipients. `None` rejects all mail.
    pub shared_secret: Option<String>,
    pub log_level: String,
    /// File logging target. `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl ZettelConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the common case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_dir = match read(env_vars::LOG_DIR) {
            Some(raw) => {
                let path = PathBuf::from(&raw);
                if !path.is_absolute() {
                    return Err(ConfigError::RelativeLogDir(raw));
                }
                Some(path)
            }
            None => None,
        };

        Ok(Self {
            db_path: PathBuf::from(
                read(env_vars::DB_PATH).unwrap_or_else(|| defaults::DB_PATH.to_string()),
            ),
            shared_secret: read(env_vars::SECRET),
            log_level: read(env_vars::LOG_LEVEL)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{defaults, env_vars, ConfigError, ZettelConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ZettelConfig, ConfigError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ZettelConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from(defaults::DB_PATH));
        assert_eq!(config.shared_secret, None);
        assert!(!config.log_level.is_empty());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn blank_secret_counts_as_unset() {
        let config = config_from(&[(env_vars::SECRET, "   ")]).unwrap();
        assert_eq!(config.shared_secret, None);
    }

    #[test]
    fn explicit_values_are_trimmed() {
        let log_dir = std::env::temp_dir().join("zettel-logs");
        let log_dir_str = log_dir.to_str().unwrap().to_string();
        let config = config_from(&[
            (env_vars::DB_PATH, " /data/z.db "),
            (env_vars::SECRET, "hunter2"),
            (env_vars::LOG_LEVEL, "warn"),
            (env_vars::LOG_DIR, log_dir_str.as_str()),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/z.db"));
        assert_eq!(config.shared_secret.as_deref(), Some("hunter2"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(log_dir));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = config_from(&[(env_vars::LOG_DIR, "logs")]).unwrap_err();
        assert_eq!(err, ConfigError::RelativeLogDir("logs".to_string()));
    }
}
