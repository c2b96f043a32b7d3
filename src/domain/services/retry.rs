use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            multiplier: 2,
            max_delay: Duration::from_secs(10),
        }
    }

    /// Delay before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Error returned once retrying stops, with the number of attempts made.
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
    /// `false` when the classifier rejected the error before exhausting attempts.
    pub retryable: bool,
}

/// Runs `operation` until it succeeds, `is_retryable` rejects the error, or
/// `policy.max_attempts` is reached. Delays grow exponentially.
pub async fn with_retry<T, E, F, Fut, C>(
    label: &str,
    policy: RetryPolicy,
    is_retryable: C,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !is_retryable(&error) {
                    return Err(RetryFailure { error, attempts: attempt, retryable: false });
                }
                if attempt >= policy.max_attempts {
                    warn!(operation = label, attempts = attempt, "retries exhausted: {}", error);
                    return Err(RetryFailure { error, attempts: attempt, retryable: true });
                }
                let delay = policy.delay_after(attempt);
                warn!(operation = label, attempt, delay_ms = delay.as_millis() as u64, "transient failure, retrying: {}", error);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(10), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, RetryFailure<String>> = with_retry(
            "flaky",
            RetryPolicy::new(3, Duration::from_millis(500)),
            |_| true,
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("attempt {} failed", n)) } else { Ok(n) }
            },
        ).await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), RetryFailure<String>> = with_retry(
            "auth",
            RetryPolicy::new(3, Duration::from_millis(500)),
            |e: &String| e != "bad credentials",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("bad credentials".to_string())
            },
        ).await;
        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 1);
        assert!(!failure.retryable);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_attempts() {
        let result: Result<(), RetryFailure<String>> = with_retry(
            "down",
            RetryPolicy::new(3, Duration::from_millis(500)),
            |_| true,
            || async { Err("connection refused".to_string()) },
        ).await;
        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert!(failure.retryable);
    }
}
