//! Environment variable names used by this crate for convenient
//! configuration of the client from services.
//!
//! These are purely helpers; [`LogglyConfig`] itself stays decoupled from
//! environment access.

use crate::config::LogglyConfig;
use crate::error::ConfigError;
use crate::wire::WireFormat;
use std::str::FromStr;
use std::time::Duration;

/// Loggly customer token.
pub const LOGGLY_TOKEN_ENV: &str = "LOGGLY_TOKEN";

/// Collector base URL, e.g. `https://logs-01.loggly.com`.
pub const LOGGLY_ENDPOINT_ENV: &str = "LOGGLY_ENDPOINT";

pub const LOGGLY_QUEUE_CAPACITY_ENV: &str = "LOGGLY_QUEUE_CAPACITY";

pub const LOGGLY_BATCH_SIZE_ENV: &str = "LOGGLY_BATCH_SIZE";

/// Flush interval in milliseconds.
pub const LOGGLY_FLUSH_INTERVAL_MS_ENV: &str = "LOGGLY_FLUSH_INTERVAL_MS";

pub const LOGGLY_MAX_RETRY_ATTEMPTS_ENV: &str = "LOGGLY_MAX_RETRY_ATTEMPTS";

/// `json` or `ndjson`.
pub const LOGGLY_WIRE_FORMAT_ENV: &str = "LOGGLY_WIRE_FORMAT";

/// Comma-separated initial tags.
pub const LOGGLY_TAGS_ENV: &str = "LOGGLY_TAGS";

/// Token from [`LOGGLY_TOKEN_ENV`], if set and non-blank.
pub fn token_from_env() -> Option<String> {
    std::env::var(LOGGLY_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
}

impl LogglyConfig {
    /// Start from [`LogglyConfig::default`] and apply every variable that
    /// is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary lookup, so
    /// callers can feed values from their own configuration source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = LogglyConfig::default();

        if let Some(endpoint) = lookup(LOGGLY_ENDPOINT_ENV) {
            cfg.endpoint = endpoint;
        }
        if let Some(v) = parse_var(&lookup, LOGGLY_QUEUE_CAPACITY_ENV)? {
            cfg.queue_capacity = v;
        }
        if let Some(v) = parse_var(&lookup, LOGGLY_BATCH_SIZE_ENV)? {
            cfg.batch_size = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, LOGGLY_FLUSH_INTERVAL_MS_ENV)? {
            cfg.flush_interval = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var(&lookup, LOGGLY_MAX_RETRY_ATTEMPTS_ENV)? {
            cfg.max_retry_attempts = v;
        }
        if let Some(raw) = lookup(LOGGLY_WIRE_FORMAT_ENV) {
            cfg.wire_format = WireFormat::parse(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                key: LOGGLY_WIRE_FORMAT_ENV.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(LOGGLY_TAGS_ENV) {
            cfg.tags = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(cfg)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value: raw,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = LogglyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, LogglyConfig::default());
    }

    #[test]
    fn applies_every_variable() {
        let cfg = LogglyConfig::from_lookup(lookup(&[
            (LOGGLY_ENDPOINT_ENV, "http://localhost:8080"),
            (LOGGLY_QUEUE_CAPACITY_ENV, "50"),
            (LOGGLY_BATCH_SIZE_ENV, " 5 "),
            (LOGGLY_FLUSH_INTERVAL_MS_ENV, "250"),
            (LOGGLY_MAX_RETRY_ATTEMPTS_ENV, "7"),
            (LOGGLY_WIRE_FORMAT_ENV, "ndjson"),
            (LOGGLY_TAGS_ENV, "ios, beta,,"),
        ]))
        .unwrap();

        assert_eq!(cfg.endpoint, "http://localhost:8080");
        assert_eq!(cfg.queue_capacity, 50);
        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.flush_interval, Duration::from_millis(250));
        assert_eq!(cfg.max_retry_attempts, 7);
        assert_eq!(cfg.wire_format, WireFormat::NdJson);
        assert_eq!(cfg.tags, vec!["ios", "beta"]);
    }

    #[test]
    fn invalid_numbers_are_reported_with_their_key() {
        let err = LogglyConfig::from_lookup(lookup(&[(LOGGLY_BATCH_SIZE_ENV, "many")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                key: LOGGLY_BATCH_SIZE_ENV.to_string(),
                value: "many".to_string(),
            }
        );
    }

    #[test]
    fn invalid_wire_format_is_reported() {
        let err = LogglyConfig::from_lookup(lookup(&[(LOGGLY_WIRE_FORMAT_ENV, "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref key, .. } if key == LOGGLY_WIRE_FORMAT_ENV));
    }
}
