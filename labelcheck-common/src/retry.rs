//! Retry Policies for External Collaborators
//!
//! The OCR service and the reference-data store are the only calls in the
//! pipeline that can fail transiently. Both go through [`retry_with_policy`],
//! which takes the operation, an explicit [`RetryPolicy`] and a predicate that
//! decides which failures are worth another attempt.
//!
//! **Backoff Strategy:**
//! - Delay before attempt `n + 1` is `initial_backoff * multiplier^(n - 1)`
//! - Capped at `max_backoff`
//! - Non-retryable errors return immediately

use std::future::Future;
use std::time::{Duration, Instant};

/// Bounded retry schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }

    /// OCR calls: one retry after 500ms
    pub fn ocr() -> Self {
        Self::new(2, Duration::from_millis(500))
    }

    /// Reference-table reads: idempotent, so three attempts are safe
    pub fn reference_lookup() -> Self {
        Self::new(3, Duration::from_millis(100))
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reference_lookup()
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of attempts.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "ocr recognize", "verified forms chunk")
/// * `policy` - Attempt bound and backoff schedule
/// * `is_retryable` - Predicate selecting transient failures
/// * `operation` - Async closure performing one attempt
///
/// # Returns
/// The first success, or the last error observed
pub async fn retry_with_policy<F, Fut, T, E, P>(
    operation_name: &str,
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let start_time = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying operation");
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Non-retryable failure"
                    );
                    return Err(err);
                }

                if attempt >= policy.max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        error = %err,
                        "Operation failed: retry attempts exhausted"
                    );
                    return Err(err);
                }

                let backoff = policy.backoff_for(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient failure, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
