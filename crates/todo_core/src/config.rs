//! Process configuration loaded once at startup.
//!
//! # Invariants
//! - The token secret is at least `MIN_SECRET_BYTES` long.
//! - The token TTL is a positive number of hours.
//! - Values are read-only after loading.

use crate::auth::DEFAULT_TOKEN_TTL_HOURS;
use crate::logging::default_log_level;
use chrono::Duration;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
pub const ENV_TOKEN_SECRET: &str = "TODO_TOKEN_SECRET";
pub const ENV_TOKEN_TTL_HOURS: &str = "TODO_TOKEN_TTL_HOURS";
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TODO_LOG_DIR";

pub const DEFAULT_DB_PATH: &str = "todo.sqlite3";
pub const MIN_SECRET_BYTES: usize = 16;
/// Upper bound for `TODO_TOKEN_TTL_HOURS` (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::Invalid { key, reason } => write!(f, "invalid setting `{key}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for storage, tokens and logging.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub token_secret: String,
    pub token_ttl: Duration,
    pub log_level: String,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("db_path", &self.db_path)
            .field("token_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl AppConfig {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let token_secret = get(ENV_TOKEN_SECRET).ok_or(ConfigError::Missing(ENV_TOKEN_SECRET))?;
        if token_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid {
                key: ENV_TOKEN_SECRET,
                reason: format!("must be at least {MIN_SECRET_BYTES} bytes"),
            });
        }

        let token_ttl = match get(ENV_TOKEN_TTL_HOURS) {
            None => Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            Some(raw) => parse_ttl_hours(&raw)?,
        };

        Ok(Self {
            db_path: get(ENV_DB_PATH).map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            token_secret,
            token_ttl,
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
        })
    }
}

fn parse_ttl_hours(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: ENV_TOKEN_TTL_HOURS,
        reason: reason.to_string(),
    };
    let hours = raw
        .parse::<i64>()
        .map_err(|_| invalid("expected a whole number of hours"))?;
    if hours <= 0 {
        return Err(invalid("must be positive"));
    }
    if hours > MAX_TOKEN_TTL_HOURS {
        return Err(invalid(&format!("must be at most {MAX_TOKEN_TTL_HOURS} hours")));
    }
    Ok(Duration::hours(hours))
}
