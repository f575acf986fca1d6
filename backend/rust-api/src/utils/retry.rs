use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            jitter_max: Some(Duration::from_millis(125)),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based), without jitter.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        std::cmp::min(self.base_backoff.saturating_mul(factor), self.max_backoff)
    }
}

/// Runs `f` until it succeeds, the error is not retryable, or attempts run out.
/// The last error is returned unchanged.
pub async fn retry_async_with_config<F, Fut, T, E, P>(
    config: RetryConfig,
    mut f: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempts_left = config.max_attempts.max(1);
    let mut retry: u32 = 0;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempts_left = attempts_left.saturating_sub(1);
                if attempts_left == 0 || !is_retryable(&e) {
                    return Err(e);
                }

                retry += 1;
                let mut wait = config.backoff_for(retry);
                if let Some(jitter_max) = config.jitter_max {
                    let jitter_ms = jitter_max.as_millis() as u64;
                    if jitter_ms > 0 {
                        wait += Duration::from_millis(rand::random::<u64>() % (jitter_ms + 1));
                    }
                }

                tracing::warn!(
                    retry,
                    attempts_left,
                    wait_ms = wait.as_millis() as u64,
                    "Retrying after transient failure: {}",
                    e
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}
