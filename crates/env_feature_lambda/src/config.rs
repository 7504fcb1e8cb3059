use std::time::Duration;

use env_feature_core::waiter::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use thiserror::Error;
use tracing::warn;

pub const POLL_INTERVAL_ENV: &str = "STACK_UPDATE_POLL_INTERVAL_SECS";
pub const MAX_ATTEMPTS_ENV: &str = "STACK_UPDATE_MAX_ATTEMPTS";
pub const RESPONSE_TIMEOUT_ENV: &str = "RESPONSE_TIMEOUT_SECS";
pub const LOG_STREAM_ENV: &str = "AWS_LAMBDA_LOG_STREAM_NAME";
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} must be a non-negative integer, got '{value}'")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub response_timeout: Duration,
    pub log_stream_name: Option<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            log_stream_name: None,
        }
    }
}

impl HandlerConfig {
    /// Loads the configuration, falling back to defaults on invalid values so
    /// that a request can still be answered.
    pub fn from_env_or_default() -> Self {
        Self::from_lookup_or_default(|name| std::env::var(name).ok())
    }

    pub fn from_lookup_or_default(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match Self::from_lookup(&lookup) {
            Ok(config) => config,
            Err(error) => {
                warn!(
                    component = "handler_config",
                    event = "config_defaults_used",
                    variable = error.name,
                    error = %error,
                );
                Self {
                    log_stream_name: log_stream_name(&lookup),
                    ..Self::default()
                }
            }
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            poll_interval: parse_number(&lookup, POLL_INTERVAL_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            max_attempts: parse_number(&lookup, MAX_ATTEMPTS_ENV)?
                .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
                .unwrap_or(defaults.max_attempts),
            response_timeout: parse_number(&lookup, RESPONSE_TIMEOUT_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.response_timeout),
            log_stream_name: log_stream_name(&lookup),
        })
    }
}

fn log_stream_name(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup(LOG_STREAM_ENV).filter(|value| !value.trim().is_empty())
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<u64>().map(Some).map_err(|_| ConfigError {
        name,
        value: raw.clone(),
    })
}
