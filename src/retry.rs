//! Retry policies and the cancellable retry executor.
//!
//! This module provides the [`RetryPolicy`] type used by
//! [`Client::send`](crate::Client::send) to handle transient transport
//! failures. A policy wraps a single fallible operation: it either runs it
//! exactly once ([`RetryPolicy::None`]) or retries it with exponentially
//! increasing delays ([`RetryPolicy::ExponentialBackoff`]).
//!
//! # Retry Strategy
//!
//! - Retries any [`Error::Transport`](crate::Error::Transport) failure
//! - Doubles the delay after every failed attempt
//! - Never retries past cancellation: a fired [`CancellationToken`] aborts
//!   the pending wait (or the in-flight attempt) and surfaces
//!   [`Error::Cancelled`](crate::Error::Cancelled) immediately
//! - Logs each retry attempt with timing information for debugging

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Fallback attempt count when a backoff config carries zero retries.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fallback delay when a backoff config carries a zero base delay.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(50);

/// Exponential backoff parameters.
///
/// Value-typed and immutable once constructed. Zero values are coerced to
/// the defaults at execution time, so a zeroed config behaves like
/// `BackoffConfig::default()` rather than disabling retries.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Maximum number of retries after the initial attempt
    /// (total attempts = `max_retries + 1`).
    pub max_retries: u32,

    /// Delay before the first retry; doubles after every failed attempt.
    pub base_delay: Duration,
}

impl Default for BackoffConfig {
    /// Reasonable default backoff configuration.
    ///
    /// - `max_retries`: 3
    /// - `base_delay`: 50ms
    fn default() -> Self {
        // ---
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

/// Strategy governing attempt count and inter-attempt delay for sends.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Execute the operation exactly once and return its result unchanged.
    #[default]
    None,

    /// Retry failed attempts with exponential backoff.
    ExponentialBackoff(BackoffConfig),
}

impl RetryPolicy {
    /// Execute `op` under this policy, racing every attempt and every
    /// backoff wait against `cancel`.
    ///
    /// # Returns
    ///
    /// - `Ok(T)` if the operation succeeds (on any attempt)
    /// - `Err(Error::Cancelled)` as soon as `cancel` fires, abandoning any
    ///   remaining attempts
    /// - the last observed error if all attempts fail without cancellation
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let config = match self {
            RetryPolicy::None => {
                // No retry configured, just execute once
                return run_attempt(cancel, op()).await;
            }
            RetryPolicy::ExponentialBackoff(config) => config,
        };

        let max_retries = match config.max_retries {
            0 => DEFAULT_MAX_RETRIES,
            n => n,
        };
        let base_delay = if config.base_delay.is_zero() {
            DEFAULT_BASE_DELAY
        } else {
            config.base_delay
        };

        let mut attempt = 0;
        let mut delay = base_delay;

        loop {
            match run_attempt(cancel, op()).await {
                Ok(value) => return Ok(value),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    if attempt >= max_retries {
                        crate::log_debug!(
                            "retry exhausted after {} attempts, last error: {}",
                            max_retries + 1,
                            err
                        );
                        return Err(err);
                    }
                    attempt += 1;

                    crate::log_debug!(
                        "retry attempt {}/{}, waiting {:?} before retry (error: {})",
                        attempt,
                        max_retries,
                        delay,
                        err
                    );

                    tokio::select! {
                        _ = sleep(delay) => delay *= 2,
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                    }
                }
            }
        }
    }
}

/// Run one attempt, aborting it the moment `cancel` fires.
async fn run_attempt<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    // ---
    tokio::select! {
        result = fut => result,
        _ = cancel.cancelled() => Err(Error::Cancelled),
    }
}
