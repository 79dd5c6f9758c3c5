//! Engine configuration, read from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `REQFLOW_CODE_PREFIX` | `REQ` |
//! | `REQFLOW_CODE_WIDTH` | `6` |
//! | `REQFLOW_USE_PERSISTENT_STORES` | `false` |
//! | `DATABASE_URL` | required when persistent |
//! | `REQFLOW_DB_MAX_CONNECTIONS` | `10` |
//! | `REQFLOW_LOG_FILTER` | `info` |

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is required when {reason}")]
    Missing { key: &'static str, reason: &'static str },

    #[error("{key}='{value}' is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub code_prefix: String,
    pub code_width: usize,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            code_prefix: "REQ".to_string(),
            code_width: 6,
            use_persistent_stores: false,
            database_url: None,
            db_max_connections: 10,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let code_prefix = lookup("REQFLOW_CODE_PREFIX").unwrap_or(defaults.code_prefix);
        if code_prefix.is_empty() || !code_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Invalid {
                key: "REQFLOW_CODE_PREFIX",
                value: code_prefix,
                reason: "must be non-empty ASCII alphanumeric".to_string(),
            });
        }

        let code_width = parse_number(&lookup, "REQFLOW_CODE_WIDTH", defaults.code_width)?;
        if !(1..=18).contains(&code_width) {
            return Err(ConfigError::Invalid {
                key: "REQFLOW_CODE_WIDTH",
                value: code_width.to_string(),
                reason: "must be between 1 and 18".to_string(),
            });
        }

        let use_persistent_stores = match lookup("REQFLOW_USE_PERSISTENT_STORES") {
            None => defaults.use_persistent_stores,
            Some(raw) => parse_flag("REQFLOW_USE_PERSISTENT_STORES", &raw)?,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing {
                key: "DATABASE_URL",
                reason: "REQFLOW_USE_PERSISTENT_STORES is enabled",
            });
        }

        Ok(Self {
            code_prefix,
            code_width,
            use_persistent_stores,
            database_url,
            db_max_connections: parse_number(
                &lookup,
                "REQFLOW_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            log_filter: lookup("REQFLOW_LOG_FILTER").unwrap_or(defaults.log_filter),
        })
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}

fn parse_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
