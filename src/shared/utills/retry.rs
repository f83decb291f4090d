//! Retry with exponential backoff
//!
//! Re-runs a whole unit of work after a transient failure. The allocation
//! engine uses it to replay a park/leave in a fresh store transaction when a
//! concurrent writer claimed a spot first.

use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_multiplier: f64,
    /// Maximum delay between retries (cap).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(250),
        }
    }
}

/// Execute an async operation with exponential backoff retry.
///
/// The `should_retry` closure determines whether a given error is transient
/// (and therefore retryable) or permanent (bail immediately).
///
/// # Example
/// ```ignore
/// let ticket = retry_with_backoff(
///     RetryConfig::default(),
///     || self.try_park(vehicle_id, vehicle_type),
///     DomainError::is_transient,
///     "park",
/// ).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt < max_attempts && should_retry(&err) => {
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(delay).await;

                // Exponential backoff with cap
                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.backoff_multiplier)
                        .min(config.max_delay.as_secs_f64()),
                );
                attempt += 1;
            }
            Err(err) => {
                if should_retry(&err) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Giving up after repeated transient failures"
                    );
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(
            fast(),
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err("busy".to_string())
                } else {
                    Ok(n)
                }
            },
            |e: &String| e == "busy",
            "test",
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("rejected".to_string())
            },
            |e: &String| e == "busy",
            "test",
        )
        .await;

        assert_eq!(result, Err("rejected".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn surfaces_transient_error_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("busy".to_string())
            },
            |_: &String| true,
            "test",
        )
        .await;

        assert_eq!(result, Err("busy".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 0,
            ..fast()
        };
        let result: Result<u8, String> = retry_with_backoff(
            config,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            },
            |_: &String| true,
            "test",
        )
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
