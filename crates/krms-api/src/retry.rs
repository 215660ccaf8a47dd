// Bounded retry for transient transport failures.
//
// Only errors reporting `is_transient()` are retried; everything else is
// returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Error;

/// How many times to attempt a request and how long to wait between tries.
///
/// The delay grows linearly: `backoff * attempt`, raised to the server's
/// `Retry-After` on rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Wait before the next attempt. A rate-limited response is never
    /// retried sooner than its `Retry-After`.
    fn delay_for(&self, err: &Error, attempt: u32) -> Duration {
        let linear = self.backoff * attempt;
        match *err {
            Error::RateLimited { retry_after_secs } => {
                linear.max(Duration::from_secs(retry_after_secs))
            }
            _ => linear,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(&err, attempt);
                    warn!(
                        what,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn unavailable() -> Error {
        Error::Api {
            status: 503,
            message: "unavailable".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::default();

        let result = policy
            .run("test", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n < 3 { Err(unavailable()) } else { Ok(n) } }
            })
            .await;

        assert_eq!(result.ok(), Some(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(10),
        };

        let result: Result<(), Error> = policy
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(unavailable()) }
            })
            .await;

        assert!(matches!(result, Err(Error::Api { status: 503, .. })));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_waits_for_retry_after() {
        let calls = Cell::new(0u32);
        let started = tokio::time::Instant::now();

        let result = RetryPolicy::default()
            .run("test", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 2 {
                        Err(Error::RateLimited { retry_after_secs: 4 })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.ok(), Some(2));
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[test]
    fn linear_backoff_wins_over_short_retry_after() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Duration::from_secs(3),
        };
        let limited = Error::RateLimited { retry_after_secs: 1 };
        assert_eq!(policy.delay_for(&limited, 2), Duration::from_secs(6));
        assert_eq!(policy.delay_for(&unavailable(), 1), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0u32);

        let result: Result<(), Error> = RetryPolicy::default()
            .run("test", || {
                calls.set(calls.get() + 1);
                async {
                    Err(Error::Authentication {
                        message: "bad password".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(Error::Authentication { .. })));
        assert_eq!(calls.get(), 1);
    }
}
