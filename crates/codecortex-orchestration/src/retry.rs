//! Caller-level retry with exponential backoff
//!
//! The orchestrator itself never retries. Callers that want to can wrap an
//! operation with [`retry_with_backoff`], which only retries errors whose
//! [`AiError::is_retryable`] flag is set.

use std::future::Future;
use std::time::Duration;

use codecortex_providers::{AiError, AiResult, ExponentialBackoff};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Run `operation`, retrying retryable failures up to `max_retries` times
///
/// A server-provided retry-after hint raises the backoff delay. Cancellation
/// during a backoff sleep ends the loop with [`AiError::Cancelled`].
pub async fn retry_with_backoff<T, F, Fut>(
    backoff: &mut ExponentialBackoff,
    max_retries: u32,
    cancel: &CancellationToken,
    mut operation: F,
) -> AiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AiResult<T>>,
{
    backoff.reset();
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() || backoff.attempt() >= max_retries {
            if backoff.attempt() > 0 {
                warn!(
                    attempts = backoff.attempt() + 1,
                    kind = %err.kind(),
                    "Giving up after retries"
                );
            }
            return Err(err);
        }

        let mut delay = backoff.next_delay();
        if let AiError::RateLimitExceeded {
            retry_after_ms: Some(ms),
        } = &err
        {
            delay = delay.max(Duration::from_millis(*ms));
        }

        debug!(
            attempt = backoff.attempt(),
            delay_ms = delay.as_millis() as u64,
            kind = %err.kind(),
            "Retrying after backoff"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(AiError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
