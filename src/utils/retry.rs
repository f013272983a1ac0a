// utils/retry.rs

use std::future::Future;
use std::time::Duration;
use log::{debug, warn};

use crate::config::subsystems::MatcherConfig;
use crate::error::{Error, Result};

/// How often and how long to try a call before giving up
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub timeout: Duration,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &MatcherConfig) -> Self {
        Self {
            attempts: config.lookup_retry_attempts.max(1),
            timeout: config.lookup_timeout(),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Exponential delay before the next attempt, with up to 10ms of jitter
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp_factor = 2u32.saturating_pow(attempt.saturating_sub(1) as u32);
        self.base_delay.saturating_mul(exp_factor) + Duration::from_millis(fastrand::u64(0..10))
    }
}

/// Run `op` until it succeeds, bounding each attempt by the policy timeout.
///
/// Returns the error of the last attempt; an attempt that times out fails
/// with `Error::IndexUnavailable`.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    debug!("{} succeeded after {} attempts", label, attempt);
                }
                return Ok(value);
            }
            Ok(Err(e)) => e,
            Err(_) => Error::index_unavailable(format!("{} timed out after {:?}", label, policy.timeout)),
        };

        if attempt >= policy.attempts {
            warn!("{} failed after {} attempts: {}", label, attempt, error);
            return Err(error);
        }

        let delay = policy.backoff(attempt);
        debug!("{} failed (attempt {}), retrying in {:?}: {}", label, attempt, delay, error);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(attempts: usize, timeout_ms: u64) -> RetryPolicy {
        RetryPolicy {
            attempts,
            timeout: Duration::from_millis(timeout_ms),
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let value = retry_with_backoff(&policy(3, 1000), "flaky", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::storage("busy"))
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn timeouts_become_index_unavailable() {
        let result: Result<()> = retry_with_backoff(&policy(2, 10), "slow", || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::IndexUnavailable(_))));
    }

    #[test]
    fn backoff_grows() {
        let p = RetryPolicy { attempts: 3, timeout: Duration::from_secs(1), base_delay: Duration::from_millis(100) };
        assert!(p.backoff(1) >= Duration::from_millis(100));
        assert!(p.backoff(3) >= Duration::from_millis(400));
    }
}
