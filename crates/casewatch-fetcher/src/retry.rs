//! Retry policy for live lookups.
//!
//! Sits outside the orchestrator: a caller wraps `fetch_case` and only
//! network and timeout failures are attempted again.

use crate::outcome::FetchOutcome;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry; later retries wait longer.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Linear backoff: attempt `n` waits `base_delay * n` before running again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Run a lookup once, never retrying.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Run `attempt` until it succeeds, fails for a non-retryable reason, or
    /// `max_attempts` is used up. Returns the last outcome.
    pub async fn run<F, Fut>(&self, mut attempt: F) -> FetchOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut n = 1;

        loop {
            let outcome = attempt().await;

            let retryable = outcome
                .failure()
                .is_some_and(|reason| reason.kind.is_retryable());
            if !retryable || n >= max_attempts {
                return outcome;
            }

            let delay = self.base_delay * n;
            tracing::warn!(
                attempt = n,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason = ?outcome.failure(),
                "live lookup failed, retrying"
            );
            tokio::time::sleep(delay).await;
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, FailureReason};
    use crate::state::FetchState;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failure(kind: FailureKind) -> FetchOutcome {
        FetchOutcome::live_failure(
            FailureReason {
                kind,
                message: kind.to_string(),
            },
            vec![FetchState::Idle, FetchState::Failed(kind)],
        )
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let calls = &AtomicU32::new(0);
        let outcome = policy()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                failure(FailureKind::Timeout)
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Timeout);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let calls = &AtomicU32::new(0);
        let outcome = policy()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                failure(FailureKind::Parse)
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Parse);
    }

    #[tokio::test]
    async fn test_stops_after_recovery() {
        let calls = &AtomicU32::new(0);
        let outcome = policy()
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    failure(FailureKind::Network)
                } else {
                    failure(FailureKind::CaptchaUnsolved)
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::CaptchaUnsolved);
    }

    #[tokio::test]
    async fn test_none_runs_once() {
        let calls = &AtomicU32::new(0);
        RetryPolicy::none()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                failure(FailureKind::Network)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
