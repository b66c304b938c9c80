//! Retrying transactional steps on transient engine failures

use std::future::Future;
use tokio_retry::strategy::jitter;
use tokio_retry::RetryIf;
use tracing::warn;
use vidgraph_sdk::{SdkError, SdkResult};

use crate::config::RetryPolicy;

/// Run `action` until it succeeds, fails permanently, or the policy is exhausted.
///
/// Only errors for which `SdkError::is_transient` holds are retried.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, step: &str, action: F) -> SdkResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SdkResult<T>>,
{
    let strategy = policy.delays().map(jitter);
    RetryIf::spawn(strategy, action, |e: &SdkError| {
        let transient = e.is_transient();
        if transient {
            warn!("{} failed transiently, retrying: {}", step, e);
        }
        transient
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 2,
            max_backoff_ms: 4,
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&policy(3), "commit", || {
            let calls = &calls;
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(SdkError::TxnAborted("conflict".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_immediately() {
        let calls = AtomicU32::new(0);
        let result: SdkResult<()> = with_retry(&policy(5), "mutate", || {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SdkError::MutationError("schema mismatch".into()))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_policy_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result: SdkResult<()> = with_retry(&policy(1), "commit", || {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SdkError::TxnAborted("conflict".into()))
            }
        })
        .await;
        assert!(matches!(result, Err(SdkError::TxnAborted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
