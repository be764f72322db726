//! Retry policy for transport calls.
//!
//! Retrying is split into a pure decision and an injected delay:
//!
//! - [`decide`] looks at how many retries already happened and what the last
//!   attempt produced, and returns a [`RetryDecision`]
//! - [`RetryDelay`] maps the retry number to a wait
//! - [`RetryPolicy::run`] drives an async operation with both
//!
//! Only connect timeouts are retried. A response of any status, and every
//! other transport failure, ends the loop immediately.
//!
//! # Example
//!
//! ```rust
//! use appwire::clients::retry::{decide, Outcome, RetryDecision};
//! use appwire::clients::{FailureKind, TransportFailure};
//!
//! let failure = TransportFailure {
//!     kind: FailureKind::ConnectTimeout,
//!     method: "GET".to_string(),
//!     uri: "https://example.com/".to_string(),
//!     message: "timed out".to_string(),
//! };
//!
//! assert_eq!(decide(0, Outcome::Failure(&failure), 10), RetryDecision::Retry);
//! assert_eq!(decide(10, Outcome::Failure(&failure), 10), RetryDecision::Stop);
//! assert_eq!(decide(0, Outcome::Response { status: 500 }, 10), RetryDecision::Stop);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::errors::{FailureKind, TransportFailure};
use crate::config::ClientConfig;

/// Default retry ceiling for one logical request.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default wait between retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// What an attempt produced.
#[derive(Clone, Copy, Debug)]
pub enum Outcome<'a> {
    /// The server answered with the given status.
    Response {
        /// HTTP status code.
        status: u16,
    },
    /// The request failed below the HTTP layer.
    Failure(&'a TransportFailure),
}

impl fmt::Display for Outcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response { status } => write!(f, "status code: {status}"),
            Self::Failure(failure) => write!(f, "{}: {}", failure.kind, failure.message),
        }
    }
}

/// Whether to make another attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again.
    Retry,
    /// Return the outcome to the caller.
    Stop,
}

/// Decides whether to retry after an attempt.
///
/// `retries` is the number of retries already made for this request, so the
/// first attempt is decided with `retries == 0`. With a ceiling of 10 a
/// request is attempted at most 11 times.
#[must_use]
pub fn decide(retries: u32, outcome: Outcome<'_>, max_retries: u32) -> RetryDecision {
    if retries >= max_retries {
        return RetryDecision::Stop;
    }
    match outcome {
        Outcome::Failure(failure) if failure.kind == FailureKind::ConnectTimeout => {
            RetryDecision::Retry
        }
        _ => RetryDecision::Stop,
    }
}

/// How long to wait before a retry.
///
/// The default is a constant 1000 ms. Use [`RetryDelay::None`] for
/// deterministic tests; the retry and stop decisions stay the same.
#[derive(Clone)]
pub enum RetryDelay {
    /// Retry immediately.
    None,
    /// A fixed wait before every retry.
    Constant(Duration),
    /// `step * n` before the n-th retry.
    Linear(Duration),
    /// A caller-supplied function of the retry number.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl RetryDelay {
    /// Returns the wait before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(delay) => *delay,
            Self::Linear(step) => step.saturating_mul(retry),
            Self::Custom(f) => f(retry),
        }
    }

    /// Wraps a delay function.
    #[must_use]
    pub fn custom(f: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }
}

impl Default for RetryDelay {
    fn default() -> Self {
        Self::Constant(DEFAULT_RETRY_DELAY)
    }
}

impl fmt::Debug for RetryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Constant(delay) => f.debug_tuple("Constant").field(delay).finish(),
            Self::Linear(step) => f.debug_tuple("Linear").field(step).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A retry ceiling paired with a delay strategy.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: RetryDelay,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, RetryDelay::default())
    }
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, delay: RetryDelay) -> Self {
        Self { max_retries, delay }
    }

    /// Creates the policy described by `config`.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_retries(), config.retry_delay().clone())
    }

    /// Returns the retry ceiling.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Runs `attempt` until it succeeds or [`decide`] says stop.
    ///
    /// Each retry logs a warning naming the request, the retry number out of
    /// the ceiling and the failure, then waits for the configured delay.
    ///
    /// # Errors
    ///
    /// Returns the last [`TransportFailure`] once retrying stops.
    pub async fn run<T, F, Fut>(&self, method: &str, uri: &str, mut attempt: F) -> Result<T, TransportFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportFailure>>,
    {
        let mut retries: u32 = 0;
        loop {
            let failure = match attempt().await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            let outcome = Outcome::Failure(&failure);
            if decide(retries, outcome, self.max_retries) == RetryDecision::Stop {
                return Err(failure);
            }

            retries += 1;
            tracing::warn!(
                "Retrying {} {} {}/{}, {}",
                method,
                uri,
                retries,
                self.max_retries,
                outcome
            );

            let delay = self.delay.delay_for(retries);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failure(kind: FailureKind) -> TransportFailure {
        TransportFailure {
            kind,
            method: "GET".to_string(),
            uri: "https://example.com/".to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_decide_retries_connect_timeout_below_ceiling() {
        let f = failure(FailureKind::ConnectTimeout);
        for retries in 0..10 {
            assert_eq!(decide(retries, Outcome::Failure(&f), 10), RetryDecision::Retry);
        }
        assert_eq!(decide(10, Outcome::Failure(&f), 10), RetryDecision::Stop);
    }

    #[test]
    fn test_decide_never_retries_other_failures() {
        for kind in [FailureKind::Connect, FailureKind::Timeout, FailureKind::Other] {
            let f = failure(kind);
            assert_eq!(decide(0, Outcome::Failure(&f), 10), RetryDecision::Stop);
        }
    }

    #[test]
    fn test_decide_never_retries_responses() {
        for status in [200, 404, 429, 500, 503] {
            assert_eq!(
                decide(0, Outcome::Response { status }, 10),
                RetryDecision::Stop
            );
        }
    }

    #[test]
    fn test_delay_strategies() {
        assert_eq!(RetryDelay::default().delay_for(1), Duration::from_millis(1000));
        assert_eq!(RetryDelay::default().delay_for(9), Duration::from_millis(1000));
        assert_eq!(RetryDelay::None.delay_for(5), Duration::ZERO);
        assert_eq!(
            RetryDelay::Constant(Duration::from_millis(250)).delay_for(3),
            Duration::from_millis(250)
        );
        assert_eq!(
            RetryDelay::Linear(Duration::from_millis(1000)).delay_for(3),
            Duration::from_millis(3000)
        );
        let custom = RetryDelay::custom(|n| Duration::from_millis(u64::from(n) * 7));
        assert_eq!(custom.delay_for(2), Duration::from_millis(14));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Response { status: 502 }.to_string(), "status code: 502");
        let f = failure(FailureKind::ConnectTimeout);
        assert_eq!(Outcome::Failure(&f).to_string(), "connect timeout: boom");
    }

    #[tokio::test]
    async fn test_run_stops_after_eleven_attempts() {
        let policy = RetryPolicy::new(10, RetryDelay::None);
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("GET", "https://example.com/", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(failure(FailureKind::ConnectTimeout)) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 11);
        assert_eq!(result.unwrap_err().kind, FailureKind::ConnectTimeout);
    }

    #[tokio::test]
    async fn test_run_returns_success_after_one_retry() {
        let policy = RetryPolicy::new(10, RetryDelay::None);
        let attempts = AtomicU32::new(0);

        let result = policy
            .run("POST", "https://example.com/", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(failure(FailureKind::ConnectTimeout))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_propagates_non_retryable_failure_immediately() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("GET", "https://example.com/", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(failure(FailureKind::Connect)) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().kind, FailureKind::Connect);
    }

    #[tokio::test]
    async fn test_run_waits_between_retries() {
        let policy = RetryPolicy::new(2, RetryDelay::Constant(Duration::from_millis(20)));
        let started = std::time::Instant::now();

        let result: Result<(), _> = policy
            .run("GET", "https://example.com/", || async {
                Err(failure(FailureKind::ConnectTimeout))
            })
            .await;

        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_run_returns_first_success_without_waiting() {
        let policy = RetryPolicy::new(3, RetryDelay::Constant(Duration::from_secs(60)));
        let result = tokio_test::block_on(policy.run("GET", "https://example.com/", || async {
            Ok::<_, TransportFailure>(7)
        }));
        assert_eq!(tokio_test::assert_ok!(result), 7);
    }
}
