use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tripbrief_core::{CoreError, CoreResult};

/// Bounded exponential backoff for idempotent reads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    pub fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::ZERO }
    }

    /// `base * 2^attempt` plus up to half a base of jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << attempt.min(10));
        let jitter_ms = self.base_delay.as_millis() as u64 / 2;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        exp + jitter
    }
}

/// Transport failures, 5xx and 429 are worth another attempt.
pub fn is_retryable(err: &CoreError) -> bool {
    match err {
        CoreError::TransportError(_) => true,
        CoreError::UpstreamError { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}

pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, op: &str, mut call: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_retries && is_retryable(&err) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!("{} failed (attempt {}): {}; retrying in {:?}", op, attempt + 1, err, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result = with_backoff(&policy, "verify", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(CoreError::UpstreamError { status: 503, message: String::new() })
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: CoreResult<()> = with_backoff(&policy, "lookup", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::UpstreamError { status: 400, message: "bad".into() })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result: CoreResult<()> = with_backoff(&policy, "lookup", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::TransportError("connection refused".into()))
        })
        .await;

        assert!(matches!(result, Err(CoreError::TransportError(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delay_grows() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert!(policy.delay_for(0) >= Duration::from_millis(100));
        assert!(policy.delay_for(2) >= Duration::from_millis(400));
        assert!(policy.delay_for(2) <= Duration::from_millis(450));
    }
}
