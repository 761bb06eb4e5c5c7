//! Bounded polling utilities with a fixed interval and optional jitter.
//!
//! This module provides a general-purpose polling mechanism for any async
//! operation that may fail transiently while an external system converges
//! (DNS propagation, eventually-consistent APIs). The policy is an explicit
//! value so tests can inject a zero-delay configuration instead of waiting
//! real wall-clock time.
//!
//! # Example
//!
//! ```ignore
//! use zonegate::poll::{poll_until, PollPolicy};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let (values, attempts) = poll_until(
//!     &PollPolicy::default(),
//!     "resolve_liveness_record",
//!     &cancel,
//!     || async { resolver.lookup_txt("kubefirst-liveness.example.com.").await },
//! ).await?;
//! ```

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Configuration for bounded polling of an eventually-consistent operation.
///
/// Unlike exponential backoff, propagation polling uses a fixed interval:
/// the delay reflects how often the external system is worth re-asking,
/// not how hard it is being hammered.
#[derive(Clone, Debug)]
pub struct PollPolicy {
    /// Maximum number of attempts (0 = poll forever)
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub interval: Duration,
    /// Apply 0.5x-1.5x jitter to each delay
    pub jitter: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            interval: Duration::from_secs(10),
            jitter: false,
        }
    }
}

impl PollPolicy {
    /// Create a policy with the given bound and interval
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            jitter: false,
        }
    }

    /// Create a policy that polls without delay (for tests)
    pub fn zero_delay(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Delay before the next attempt, with jitter applied if configured
    fn delay(&self) -> Duration {
        if self.jitter && !self.interval.is_zero() {
            let factor = rand::thread_rng().gen_range(0.5..1.5);
            Duration::from_secs_f64(self.interval.as_secs_f64() * factor)
        } else {
            self.interval
        }
    }
}

/// Terminal outcomes of an exhausted or aborted poll
#[derive(Debug, Error)]
pub enum PollError<E> {
    /// The caller cancelled the wait before the operation succeeded
    #[error("poll cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts completed before cancellation
        attempts: u32,
    },

    /// The attempt bound was reached without a success
    #[error("poll exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Total attempts made
        attempts: u32,
        /// The error from the final attempt
        last: E,
    },
}

/// Poll an async operation until it succeeds, the bound is reached, or the
/// caller cancels.
///
/// Individual failures are absorbed and logged at warn level; only the
/// aggregate outcome escalates. On success the number of attempts made is
/// returned alongside the value, so callers can report how long propagation
/// took.
///
/// # Arguments
/// * `policy` - Attempt bound and inter-attempt delay
/// * `operation_name` - Name for logging purposes
/// * `cancel` - Token that aborts the wait between attempts
/// * `operation` - The async operation to poll
pub async fn poll_until<F, Fut, T, E>(
    policy: &PollPolicy,
    operation_name: &str,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<(T, u32), PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok((result, attempt)),
            Err(e) => {
                if policy.max_attempts > 0 && attempt >= policy.max_attempts {
                    error!(
                        operation = %operation_name,
                        attempts = attempt,
                        error = %e,
                        "Poll exhausted attempt bound"
                    );
                    return Err(PollError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }

                let delay = policy.delay();
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis(),
                    "Attempt failed, waiting before retry"
                );

                tokio::select! {
                    _ = cancel.cancelled() => {
                        warn!(
                            operation = %operation_name,
                            attempts = attempt,
                            "Poll cancelled by caller"
                        );
                        return Err(PollError::Cancelled { attempts: attempt });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
