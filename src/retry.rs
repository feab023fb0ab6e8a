//! Exponential backoff around a single network call.

use crate::config::RetryPolicy;
use crate::error::Result;
use std::future::Future;
use tracing::{debug, warn};

/// Run `operation` until it succeeds, fails permanently, or the policy is exhausted.
///
/// Only errors for which [`HarvestError::is_transient`](crate::HarvestError::is_transient)
/// holds are retried. The last error is returned once attempts run out.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(label, attempts = attempt + 1, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                let wait = policy.backoff(attempt);
                warn!(
                    label,
                    attempt = attempt + 1,
                    wait_ms = wait.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    warn!(label, attempts = max_attempts, error = %e, "All attempts failed");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(RetryPolicy::immediate(3), "test", move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(HarvestError::RateLimited)
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(RetryPolicy::immediate(3), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(HarvestError::Api {
                code: 502,
                message: "bad gateway".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(RetryPolicy::immediate(3), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(HarvestError::Api {
                code: 400,
                message: "bad filter".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(HarvestError::Api { code: 400, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
