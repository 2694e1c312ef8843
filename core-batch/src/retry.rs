//! # Idempotent Retry Wrapper
//!
//! Executes one remote write so that repeated ambiguous failures never apply
//! it twice.
//!
//! ## Overview
//!
//! A write over an unreliable network can fail after the server already
//! processed it. Retrying blindly would then upload the same photo twice or
//! create two albums with the same title. Each write therefore comes with a
//! read-only *verify probe* that looks for the effect of the write:
//!
//! 1. Run the attempt. `Applied` returns immediately.
//! 2. `NotApplied` means the service guarantees nothing happened; no probe
//!    is needed.
//! 3. `Unknown` runs the probe. If it finds the effect, the write counts as
//!    applied and the probe's value is returned. A failing probe ends the
//!    item with [`BatchError::VerificationFailed`].
//! 4. When the budget is spent the last error is returned as
//!    [`BatchError::RetriesExhausted`]. Otherwise sleep and go back to 1.
//!
//! The probe always runs before the next attempt, so a retry never fires for
//! an item already known to exist.
//!
//! ## Usage
//!
//! ```ignore
//! let retry = IdempotentRetry::new(RetryPolicy::default());
//! let photo_id = retry
//!     .execute(
//!         "upload",
//!         || service.upload_file(&path, &title),
//!         || async {
//!             Ok(service
//!                 .find_unfiled_by_title(&title)
//!                 .await?
//!                 .map(|photo| photo.id))
//!         },
//!     )
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use bridge_traits::{error::Result as BridgeResult, WriteOutcome};
use core_runtime::config::UploaderConfig;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{BatchError, Result};

/// Attempt budget and backoff of the retry wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(config.retry_max_attempts, config.retry_delay)
    }

    /// Delay before the next attempt. A throttling hint from the service can
    /// lengthen it but never shorten it.
    fn delay_after(&self, error: &bridge_traits::BridgeError) -> Duration {
        error
            .retry_after()
            .map_or(self.delay, |hint| hint.max(self.delay))
    }
}

/// Retry-with-verification executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdempotentRetry {
    policy: RetryPolicy,
}

impl IdempotentRetry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` until it is applied, verified, or out of budget.
    ///
    /// `attempt` may return a plain `bridge_traits::error::Result<T>`, which
    /// is classified through [`WriteOutcome::from`], or a [`WriteOutcome`]
    /// directly when the collaborator knows more.
    pub async fn execute<T, A, AFut, O, V, VFut>(
        &self,
        operation: &str,
        mut attempt: A,
        mut verify: V,
    ) -> Result<T>
    where
        A: FnMut() -> AFut,
        AFut: Future<Output = O>,
        O: Into<WriteOutcome<T>>,
        V: FnMut() -> VFut,
        VFut: Future<Output = BridgeResult<Option<T>>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let error = match attempt().await.into() {
                WriteOutcome::Applied(value) => {
                    if attempts > 1 {
                        debug!(operation, attempts, "Operation applied after retry");
                    }
                    return Ok(value);
                }
                WriteOutcome::NotApplied(error) => {
                    debug!(operation, attempt = attempts, error = %error, "Operation not applied");
                    error
                }
                WriteOutcome::Unknown(error) => {
                    warn!(operation, attempt = attempts, error = %error, "Operation outcome unknown");
                    match verify().await {
                        Ok(Some(value)) => {
                            info!(operation, attempt = attempts, "Verify probe found the operation applied");
                            return Ok(value);
                        }
                        Ok(None) => error,
                        Err(source) => {
                            return Err(BatchError::VerificationFailed {
                                operation: operation.to_string(),
                                source,
                            });
                        }
                    }
                }
            };

            if attempts >= max_attempts {
                warn!(operation, attempts, error = %error, "Retry budget exhausted");
                return Err(BatchError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts,
                    source: error,
                });
            }

            sleep(self.policy.delay_after(&error)).await;
        }
    }

    /// Retry a write that is harmless to apply twice, such as setting a
    /// timestamp or visibility flags. No probe is run.
    pub async fn execute_unverified<T, A, AFut>(&self, operation: &str, attempt: A) -> Result<T>
    where
        A: FnMut() -> AFut,
        AFut: Future<Output = BridgeResult<T>>,
    {
        self.execute(operation, attempt, || async { Ok(None) }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn ambiguous() -> BridgeError {
        BridgeError::OperationFailed("connection reset".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_skips_verify() {
        let retry = IdempotentRetry::default();
        let verifies = AtomicU32::new(0);

        let value: i32 = retry
            .execute(
                "upload",
                || async { Ok::<_, BridgeError>(42) },
                || {
                    verifies.fetch_add(1, Ordering::SeqCst);
                    async { Ok(None) }
                },
            )
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(verifies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_hit_prevents_second_attempt() {
        // The server stores the photo but the response is lost
        let stored = Arc::new(AtomicU32::new(0));
        let attempts = AtomicU32::new(0);
        let retry = IdempotentRetry::default();

        let id = retry
            .execute(
                "upload",
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    let stored = Arc::clone(&stored);
                    async move {
                        stored.fetch_add(1, Ordering::SeqCst);
                        Err::<String, _>(ambiguous())
                    }
                },
                || {
                    let stored = Arc::clone(&stored);
                    async move {
                        Ok((stored.load(Ordering::SeqCst) > 0).then(|| "photo-1".to_string()))
                    }
                },
            )
            .await
            .unwrap();

        assert_eq!(id, "photo-1");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(stored.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_verify_hit() {
        let attempts = AtomicU32::new(0);
        let verifies = AtomicU32::new(0);
        let retry = IdempotentRetry::default();

        let id = retry
            .execute(
                "upload",
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Err::<u32, _>(ambiguous()) }
                },
                || {
                    let n = verifies.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { Ok((n == 2).then_some(7)) }
                },
            )
            .await
            .unwrap();

        assert_eq!(id, 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(verifies.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_is_exact() {
        let attempts = AtomicU32::new(0);
        let verifies = AtomicU32::new(0);
        let retry = IdempotentRetry::new(RetryPolicy::new(5, Duration::from_millis(1000)));
        let started = Instant::now();

        let result: Result<()> = retry
            .execute(
                "move",
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(ambiguous()) }
                },
                || {
                    verifies.fetch_add(1, Ordering::SeqCst);
                    async { Ok(None) }
                },
            )
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        assert_eq!(verifies.load(Ordering::SeqCst), 5);
        // Four pauses between five attempts
        assert_eq!(started.elapsed(), Duration::from_millis(4000));
        match result {
            Err(BatchError::RetriesExhausted {
                attempts, source, ..
            }) => {
                assert_eq!(attempts, 5);
                assert!(matches!(source, BridgeError::OperationFailed(_)));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_applied_skips_verify() {
        let attempts = AtomicU32::new(0);
        let verifies = AtomicU32::new(0);
        let retry = IdempotentRetry::new(RetryPolicy::new(3, Duration::from_millis(10)));

        let value: &str = retry
            .execute(
                "upload",
                || {
                    let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n < 3 {
                            WriteOutcome::NotApplied(BridgeError::Rejected("busy".into()))
                        } else {
                            WriteOutcome::Applied("photo-3")
                        }
                    }
                },
                || {
                    verifies.fetch_add(1, Ordering::SeqCst);
                    async { Ok(None) }
                },
            )
            .await
            .unwrap();

        assert_eq!(value, "photo-3");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(verifies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_error_stops_retrying() {
        let attempts = AtomicU32::new(0);
        let retry = IdempotentRetry::default();

        let result: Result<String> = retry
            .execute(
                "create album",
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Err::<String, _>(ambiguous()) }
                },
                || async { Err(BridgeError::OperationFailed("probe timed out".into())) },
            )
            .await;

        assert!(matches!(result, Err(BatchError::VerificationFailed { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttling_hint_lengthens_delay() {
        let attempts = AtomicU32::new(0);
        let retry = IdempotentRetry::new(RetryPolicy::new(2, Duration::from_millis(100)));
        let started = Instant::now();

        let result = retry
            .execute_unverified("set date", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(BridgeError::Throttled {
                        retry_after_secs: Some(3),
                    })
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        match result {
            Err(BatchError::RetriesExhausted { source, .. }) => {
                assert!(matches!(source, BridgeError::Throttled { .. }))
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = UploaderConfig::builder()
            .retry_max_attempts(3)
            .retry_delay(Duration::from_millis(20))
            .build()
            .unwrap();
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy, RetryPolicy::new(3, Duration::from_millis(20)));
    }
}
