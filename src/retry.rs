//! Bounded retry with a typed outcome.
//!
//! An operation reports what should happen next through [`RetryOutcome`];
//! [`retry_until`] runs it until it succeeds, fails fatally, or the wall-clock
//! budget runs out. Every attempt is raced against the deadline, so a hung
//! call cannot outlive the budget.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_datahub::retry::{retry_until, RetryOutcome};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let result = retry_until(Duration::from_secs(5), |attempt| async move {
//!     if attempt < 3 {
//!         RetryOutcome::RetryAfter {
//!             delay: Duration::from_millis(1),
//!             cause: "not yet",
//!         }
//!     } else {
//!         RetryOutcome::Success(attempt)
//!     }
//! })
//! .await;
//! assert_eq!(result.unwrap(), 3);
//! # });
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// What a single attempt asks the driver to do next.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Stop and return the value.
    Success(T),
    /// Try again after `delay`; `cause` is kept for the timeout report.
    RetryAfter {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// The transient error that triggered the retry.
        cause: E,
    },
    /// Stop and return the error.
    Fatal(E),
}

/// Why [`retry_until`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// An attempt returned [`RetryOutcome::Fatal`].
    Fatal(E),
    /// The budget ran out.
    Timeout {
        /// Time spent since the first attempt.
        elapsed: Duration,
        /// Attempts started, including one cut off by the deadline.
        attempts: u32,
        /// The most recent retryable cause, if any attempt produced one.
        last_error: Option<E>,
    },
}

/// Exponential backoff with a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// Delay after the first failed attempt.
    pub initial: Duration,
    /// Growth factor between consecutive delays.
    pub factor: u32,
    /// Upper bound on any single delay.
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 2,
            max: Duration::from_secs(10),
        }
    }
}

impl ExponentialBackoff {
    /// Create backoff settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first delay.
    pub fn with_initial(mut self, initial: Duration) -> Self {
        self.initial = initial;
        self
    }

    /// Set the growth factor.
    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor;
        self
    }

    /// Set the cap.
    pub fn with_max(mut self, max: Duration) -> Self {
        self.max = max;
        self
    }

    /// Delay to wait after the given attempt (1-based) failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.factor.max(1).checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(multiplier)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

/// Run `op` until it succeeds, fails fatally, or `budget` elapses.
///
/// `op` receives the 1-based attempt number. Sleeps are clipped to the
/// remaining budget.
pub async fn retry_until<T, E, F, Fut>(budget: Duration, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = RetryOutcome<T, E>>,
{
    let start = Instant::now();
    let deadline = start + budget;
    let mut last_error = None;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let outcome = match tokio::time::timeout_at(deadline, op(attempt)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return Err(RetryError::Timeout {
                    elapsed: start.elapsed(),
                    attempts: attempt,
                    last_error,
                })
            },
        };

        match outcome {
            RetryOutcome::Success(value) => return Ok(value),
            RetryOutcome::Fatal(err) => return Err(RetryError::Fatal(err)),
            RetryOutcome::RetryAfter { delay, cause } => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(RetryError::Timeout {
                        elapsed: start.elapsed(),
                        attempts: attempt,
                        last_error: Some(cause),
                    });
                }
                let wait = delay.min(deadline - now);
                debug!(attempt, wait = ?wait, "Attempt failed, retrying");
                last_error = Some(cause);
                tokio::time::sleep(wait).await;
            },
        }
    }
}
