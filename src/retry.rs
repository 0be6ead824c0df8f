use anyhow::Result;
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio::time;

/// Bounded retries with quadratic backoff.
///
/// After a failed attempt `i` (counting from 0) the next attempt waits
/// `backoff_unit * i²`, so the waits run 0, 1, 4, 9, ... units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .checked_mul(attempt.saturating_mul(attempt))
            .unwrap_or(Duration::MAX)
    }
}

/// Outcome of [`retry_with_backoff`]
#[derive(Debug)]
pub struct Retried<T> {
    /// `None` when every attempt failed
    pub value: Option<T>,
    pub attempts: u32,
    pub waited: Duration,
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the attempt index. Failures are logged with `label` and are
/// not returned; there is no sleep after the last attempt.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Retried<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut waited = Duration::ZERO;

    for attempt in 0..policy.max_attempts {
        match op(attempt).await {
            Ok(value) => {
                return Retried {
                    value: Some(value),
                    attempts: attempt + 1,
                    waited,
                }
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {:#}", label, attempt + 1, e);
                if attempt + 1 < policy.max_attempts {
                    let delay = policy.delay_for(attempt);
                    time::sleep(delay).await;
                    waited += delay;
                }
            }
        }
    }

    Retried {
        value: None,
        attempts: policy.max_attempts,
        waited,
    }
}
