//! Bounded retry for tool invocations.
//!
//! Each failed attempt is logged. Errors that cannot succeed on a second try
//! (see [`crate::error::BriefError::is_retryable`]) end the loop immediately.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// A policy with `max_attempts` attempts and no delay.
    pub fn attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Set the pause between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// Returns the first success, or the error from the final attempt.
pub async fn retry<F, Fut, T>(policy: RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}/{}", label, attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(e) => {
                error!(
                    "Error in {} attempt {}/{}: {}",
                    label, attempt, max_attempts, e
                );
                if attempt >= max_attempts || !e.is_retryable() {
                    return Err(e);
                }
            }
        }

        attempt += 1;
        if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BriefError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = retry(RetryPolicy::default(), "flaky", move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(BriefError::Provider(format!("failure {}", n)))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<()> = retry(RetryPolicy::default(), "broken", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(BriefError::Provider("down".to_string()))
        })
        .await;

        assert!(matches!(result, Err(BriefError::Provider(msg)) if msg == "down"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<()> = retry(RetryPolicy::default(), "config", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(BriefError::Config("no key".to_string()))
        })
        .await;

        assert!(matches!(result, Err(BriefError::Config(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = retry(RetryPolicy::attempts(0), "once", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BriefError>(())
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_builder() {
        let policy = RetryPolicy::attempts(5).with_delay(Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(10));
        assert_eq!(RetryPolicy::default().max_attempts, 3);
        assert!(RetryPolicy::default().delay.is_zero());
    }
}
