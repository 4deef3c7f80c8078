//! Bounded per-endpoint retry with exponential backoff and jitter.

use crate::config::RetryConfig;
use crate::error::EndpointError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Pause before retry number `retry` of an endpoint call.
///
/// Retry 0 is the first attempt and never waits. Retry `n` waits
/// `base_ms * 2^(n-1)`, clamped to `max_ms`, plus a random extra of less
/// than a tenth of the clamped wait.
pub fn calculate_backoff(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    let Some(doublings) = retry.checked_sub(1) else {
        return Duration::ZERO;
    };

    let factor = 1u64.checked_shl(doublings).unwrap_or(u64::MAX);
    let wait_ms = base_ms.saturating_mul(factor).min(max_ms);
    let spread_ms = match wait_ms / 10 {
        0 => 0,
        tenth => rand::thread_rng().gen_range(0..tenth),
    };

    Duration::from_millis(wait_ms + spread_ms)
}

/// How many extra attempts one endpoint call may take.
///
/// `max_retries == 0` means exactly one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, config: RetryConfig) -> Self {
        Self {
            max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    pub fn none() -> Self {
        Self::new(0, RetryConfig::default())
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's retries are used up. The last error is returned.
pub async fn with_retries<T, F, Fut>(
    policy: RetryPolicy,
    endpoint: &str,
    mut op: F,
) -> Result<T, EndpointError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EndpointError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = calculate_backoff(attempt, policy.base_delay_ms, policy.max_delay_ms);
                tracing::debug!(
                    endpoint,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying endpoint call"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
