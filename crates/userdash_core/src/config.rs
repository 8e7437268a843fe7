//! Runtime configuration for dashboard front ends.
//!
//! Defaults cover a local run; `USERDASH_*` environment variables override
//! individual fields (`USERDASH_DB_PATH`, `USERDASH_SEED_URL`,
//! `USERDASH_SEED_TIMEOUT_SECS`, `USERDASH_LOG_LEVEL`, `USERDASH_LOG_DIR`,
//! `USERDASH_STORAGE_KEY`).

use crate::repo::user_repo::USERS_STORAGE_KEY;
use crate::seed::{DEFAULT_SEED_TIMEOUT, DEFAULT_SEED_URL};
use ::config::{Config, Environment};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Prefix of every override variable.
pub const ENV_PREFIX: &str = "USERDASH";

const DEFAULT_DB_FILE_NAME: &str = "userdash.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    /// Override source could not be read or deserialized.
    Source(::config::ConfigError),
    InvalidValue { name: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "invalid configuration: {err}"),
            Self::InvalidValue { name, value } => {
                write!(f, "invalid value `{value}` for {name}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(value: ::config::ConfigError) -> Self {
        Self::Source(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub db_path: PathBuf,
    pub storage_key: String,
    pub seed_url: String,
    pub seed_timeout_secs: u64,
    pub log_level: Option<String>,
    /// Absolute directory for rotating log files; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            storage_key: USERS_STORAGE_KEY.to_string(),
            seed_url: DEFAULT_SEED_URL.to_string(),
            seed_timeout_secs: DEFAULT_SEED_TIMEOUT.as_secs(),
            log_level: None,
            log_dir: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Defaults overridden by `vars`, given as `(USERDASH_NAME, value)` pairs
    /// instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: ::config::Map<String, String> = vars
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(map)))
    }

    /// Bootstrap fetch timeout.
    pub fn seed_timeout(&self) -> Duration {
        Duration::from_secs(self.seed_timeout_secs)
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(environment.ignore_empty(true))
            .build()?
            .try_deserialize()?;
        config.normalized()
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        if self.seed_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "seed_timeout_secs",
                value: self.seed_timeout_secs.to_string(),
            });
        }
        self.seed_url = self.seed_url.trim().to_string();
        if self.seed_url.is_empty() {
            self.seed_url = DEFAULT_SEED_URL.to_string();
        }
        self.log_level = non_blank(self.log_level);
        self.log_dir = self
            .log_dir
            .filter(|dir| !dir.as_os_str().to_string_lossy().trim().is_empty());
        Ok(self)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DashboardConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn defaults_apply_without_overrides() {
        let config = DashboardConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.storage_key, "users");
        assert_eq!(config.seed_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn prefixed_overrides_are_applied_and_blank_values_ignored() {
        let config = DashboardConfig::from_vars([
            ("USERDASH_DB_PATH", "/tmp/x.db"),
            ("USERDASH_SEED_URL", " http://localhost:9/users "),
            ("USERDASH_SEED_TIMEOUT_SECS", "3"),
            ("USERDASH_LOG_LEVEL", "  "),
            ("USERDASH_STORAGE_KEY", ""),
            ("OTHER_DB_PATH", "/ignored.db"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.seed_url, "http://localhost:9/users");
        assert_eq!(config.seed_timeout(), Duration::from_secs(3));
        assert_eq!(config.log_level, None);
        assert_eq!(config.storage_key, "users");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = DashboardConfig::from_vars([("USERDASH_SEED_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "seed_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_timeout_is_a_source_error() {
        let err =
            DashboardConfig::from_vars([("USERDASH_SEED_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Source(_)));
    }
}
