//! Environment-driven configuration.
//!
//! Environment variables:
//! - `WAYFARER_BIND_ADDR`: listen address (default: `0.0.0.0:8080`)
//! - `USE_PERSISTENT_STORES`: `true` selects Postgres (default: `false`)
//! - `DATABASE_URL`: required when persistent stores are enabled
//! - `WAYFARER_NUMBERING_MAX_ATTEMPTS`: insertion attempts per create (default: 3)
//! - `WAYFARER_NUMBERING_BACKOFF_MS`: base delay between attempts (default: 0)
//! - `WAYFARER_NUMBERING_MAX_BACKOFF_MS`: delay cap (default: 1000)
//! - `WAYFARER_NUMBERING_STRICT`: reject malformed stored numbers instead of restarting at 1
//! - `WAYFARER_NUMBERING_STRATEGY`: `max_scan` (default) or `counter`
//!
//! Unparseable values are logged and replaced by their default.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use wayfarer_documents::MalformedNumberPolicy;

use crate::retry::{BackoffStrategy, RetryPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// How the service picks the next sequence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberingStrategy {
    /// Read the family's current maximum and add one.
    #[default]
    MaxScan,
    /// Reserve the value from a dedicated per-family counter.
    Counter,
}

impl FromStr for NumberingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max_scan" | "max-scan" | "maxscan" => Ok(Self::MaxScan),
            "counter" => Ok(Self::Counter),
            other => Err(format!("unknown numbering strategy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NumberingConfig {
    pub retry: RetryPolicy,
    pub malformed: MalformedNumberPolicy,
    pub strategy: NumberingStrategy,
}

impl NumberingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        let max_attempts = parse_or(
            "WAYFARER_NUMBERING_MAX_ATTEMPTS",
            &lookup,
            default.retry.max_attempts,
        )
        .max(1);
        let base_ms = parse_or(
            "WAYFARER_NUMBERING_BACKOFF_MS",
            &lookup,
            default.retry.base_delay.as_millis() as u64,
        );
        let max_ms = parse_or(
            "WAYFARER_NUMBERING_MAX_BACKOFF_MS",
            &lookup,
            default.retry.max_delay.as_millis() as u64,
        );
        let strict = parse_or("WAYFARER_NUMBERING_STRICT", &lookup, false);
        let strategy = parse_or("WAYFARER_NUMBERING_STRATEGY", &lookup, default.strategy);

        let retry = RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms.max(base_ms)),
            strategy: if base_ms == 0 {
                BackoffStrategy::Fixed
            } else {
                BackoffStrategy::Exponential
            },
        };

        Self {
            retry,
            malformed: if strict {
                MalformedNumberPolicy::Reject
            } else {
                MalformedNumberPolicy::Restart
            },
            strategy,
        }
    }
}

/// Process configuration for the API binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub numbering: NumberingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            use_persistent_stores: false,
            database_url: None,
            numbering: NumberingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();
        let use_persistent_stores = parse_or("USE_PERSISTENT_STORES", &lookup, false);
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            bind_addr: lookup("WAYFARER_BIND_ADDR").unwrap_or(default.bind_addr),
            use_persistent_stores,
            database_url,
            numbering: NumberingConfig::from_lookup(&lookup),
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, fallback = ?default, "invalid configuration value");
                default
            }
        },
    }
}
