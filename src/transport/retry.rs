// ABOUTME: Bounded exponential backoff for transient transport failures.
// ABOUTME: Permanent failures propagate immediately without a retry.

use std::future::Future;
use std::time::Duration;

use super::TransportError;

/// Retry bounds for transient transport failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Run `f`, retrying transient failures up to the policy's attempt bound
/// with exponential backoff. Permanent failures return immediately.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut delay = policy.base_delay;
    let mut attempt: u32 = 1;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.attempts => {
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient transport failure, retrying: {}",
                    e
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
