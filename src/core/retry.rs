//! Bounded-time retry of ledger operations.
//!
//! Each attempt runs under a timeout. Attempts that fail with a transient error
//! (timeout, pool exhaustion, `SQLITE_BUSY`, balance contention) are retried with
//! a linear backoff until the budget is spent, at which point the caller gets
//! [`Error::TransientStoreFailure`]. Every other error is returned unchanged on
//! the first occurrence.
//!
//! Attempts must be all-or-nothing (one store transaction each) so that a failed
//! attempt leaves nothing behind for the next one to trip over. They must also
//! stop short of committing: an attempt abandoned by the timer mid-commit can
//! still land, so the caller commits the value `run` hands back, once.

use crate::errors::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry budget and per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    attempt_timeout: Duration,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5), Duration::from_millis(50))
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    #[must_use]
    pub const fn new(max_attempts: u32, attempt_timeout: Duration, backoff: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            attempt_timeout,
            backoff,
        }
    }

    /// Total attempts allowed
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound for a single attempt
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Runs `attempt` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// `operation` only labels log lines.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_failure = String::new();

        for attempt_no in 1..=self.max_attempts {
            match tokio::time::timeout(self.attempt_timeout, attempt()).await {
                Ok(Ok(value)) => {
                    if attempt_no > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt_no);
                    }
                    return Ok(value);
                }
                Ok(Err(err)) if err.is_transient() => {
                    warn!(
                        "{} attempt {}/{} failed transiently: {}",
                        operation, attempt_no, self.max_attempts, err
                    );
                    last_failure = err.to_string();
                }
                Ok(Err(err)) => return Err(err),
                Err(_elapsed) => {
                    warn!(
                        "{} attempt {}/{} timed out after {:?}",
                        operation, attempt_no, self.max_attempts, self.attempt_timeout
                    );
                    last_failure = format!("timed out after {:?}", self.attempt_timeout);
                }
            }

            if attempt_no < self.max_attempts {
                tokio::time::sleep(self.backoff * attempt_no).await;
            }
        }

        Err(Error::TransientStoreFailure {
            attempts: self.max_attempts,
            message: last_failure,
        })
    }
}
