//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::classify::ErrorClassifier;
use super::error::{Cancelled, RemoteFailure};
use super::policy::{RetryDecision, RetryPolicy};

/// Per-call retry state. Owned by one invocation of the loop and dropped when it exits.
#[derive(Debug)]
pub struct RetryAttemptContext<E> {
    /// 1-based number of the try in progress.
    pub attempt: u32,
    pub last_error: Option<E>,
}

impl<E> RetryAttemptContext<E> {
    fn new() -> Self {
        Self {
            attempt: 1,
            last_error: None,
        }
    }
}

/// Runs `op` until it succeeds or the retry policy says to stop.
///
/// On a transient failure with budget left, sleeps for the backoff duration
/// and tries again. The failure that ends the loop is returned as-is, so
/// callers see exactly what an unwrapped call would have produced.
/// A `None` policy runs `op` exactly once.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: Option<&RetryPolicy>,
    classifier: &ErrorClassifier,
    op: F,
) -> Result<T, E>
where
    E: RemoteFailure,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_loop(&RetryPolicy::or_none(policy), classifier, None, op).await
}

/// Like [`run_with_retry`], but gives up as soon as `cancel` fires.
///
/// A cancellation observed before an attempt or while waiting between attempts
/// ends the call with `E::from(Cancelled)`. A cancellation that surfaces from
/// inside `op` is an ordinary failure and is classified fatal.
pub async fn run_with_retry_cancellable<T, E, F, Fut>(
    policy: Option<&RetryPolicy>,
    classifier: &ErrorClassifier,
    cancel: &CancellationToken,
    op: F,
) -> Result<T, E>
where
    E: RemoteFailure + From<Cancelled>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let on_cancel: fn(Cancelled) -> E = <E as From<Cancelled>>::from;
    let policy = RetryPolicy::or_none(policy);
    retry_loop(&policy, classifier, Some((cancel, on_cancel)), op).await
}

async fn retry_loop<T, E, F, Fut>(
    policy: &RetryPolicy,
    classifier: &ErrorClassifier,
    cancel: Option<(&CancellationToken, fn(Cancelled) -> E)>,
    mut op: F,
) -> Result<T, E>
where
    E: RemoteFailure,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut ctx = RetryAttemptContext::new();
    loop {
        if let Some((token, cancelled)) = cancel {
            if token.is_cancelled() {
                tracing::debug!(attempt = ctx.attempt, "call cancelled before attempt");
                return Err(cancelled(Cancelled));
            }
        }

        let err = match op().await {
            Ok(value) => {
                if ctx.attempt > 1 {
                    tracing::info!(attempts = ctx.attempt, "call succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !policy.enabled {
            return Err(err);
        }

        let failure = classifier.classify(&err);
        let delay = match policy.decide(ctx.attempt, &failure) {
            RetryDecision::NoRetry(reason) => {
                tracing::debug!(
                    attempt = ctx.attempt,
                    kind = ?failure.kind,
                    reason = ?reason,
                    error = %err,
                    "not retrying"
                );
                return Err(err);
            }
            RetryDecision::RetryAfter(d) => d,
        };

        tracing::warn!(
            attempt = ctx.attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            status = ?failure.status_code,
            code = ?failure.error_code,
            error = %err,
            "transient failure, retrying"
        );
        ctx.last_error = Some(err);

        if let Some((token, cancelled)) = cancel {
            if !sleep_unless_cancelled(token, delay).await {
                tracing::debug!(
                    attempt = ctx.attempt,
                    last_error = ?ctx.last_error.as_ref().map(|e| e.to_string()),
                    "call cancelled during backoff"
                );
                return Err(cancelled(Cancelled));
            }
        } else {
            tokio::time::sleep(delay).await;
        }
        // decide() stops at u32::MAX, so this cannot overflow.
        ctx.attempt += 1;
    }
}

/// Returns false when the token fired before the delay elapsed.
async fn sleep_unless_cancelled(token: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
