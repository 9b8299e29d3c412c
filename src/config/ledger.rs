//! Ledger runtime settings loaded from environment variables.
//!
//! All settings are optional; unset variables fall back to defaults that suit
//! a single household on a local `SQLite` file.

use crate::core::retry::RetryPolicy;
use crate::errors::{Error, Result};
use std::time::Duration;

const STORE_TIMEOUT_VAR: &str = "LEDGER_STORE_TIMEOUT_MS";
const RETRY_ATTEMPTS_VAR: &str = "LEDGER_RETRY_ATTEMPTS";
const RETRY_BACKOFF_VAR: &str = "LEDGER_RETRY_BACKOFF_MS";
const MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";

/// Timeouts, retry budget, and pool size for the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Upper bound for one attempt at a ledger operation, lock wait included
    pub store_timeout: Duration,
    /// Total attempts for an operation that keeps failing transiently
    pub retry_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_backoff`
    pub retry_backoff: Duration,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(5_000),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(50),
            max_connections: 5,
        }
    }
}

impl LedgerSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which returns the raw value of a variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store_timeout = parse_var(&lookup, STORE_TIMEOUT_VAR)?
            .map_or(defaults.store_timeout, Duration::from_millis);
        let retry_backoff = parse_var(&lookup, RETRY_BACKOFF_VAR)?
            .map_or(defaults.retry_backoff, Duration::from_millis);
        let retry_attempts =
            parse_var::<u32, _>(&lookup, RETRY_ATTEMPTS_VAR)?.unwrap_or(defaults.retry_attempts);
        let max_connections =
            parse_var::<u32, _>(&lookup, MAX_CONNECTIONS_VAR)?.unwrap_or(defaults.max_connections);

        if store_timeout.is_zero() {
            return Err(Error::Config {
                message: format!("{STORE_TIMEOUT_VAR} must be greater than zero"),
            });
        }
        if retry_attempts == 0 {
            return Err(Error::Config {
                message: format!("{RETRY_ATTEMPTS_VAR} must be at least 1"),
            });
        }
        if max_connections == 0 {
            return Err(Error::Config {
                message: format!("{MAX_CONNECTIONS_VAR} must be at least 1"),
            });
        }

        Ok(Self {
            store_timeout,
            retry_attempts,
            retry_backoff,
            max_connections,
        })
    }

    /// Retry policy derived from these settings.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.store_timeout, self.retry_backoff)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| Error::Config {
                message: format!("Invalid value {raw:?} for {key}: {e}"),
            })
        })
        .transpose()
}
