// Bounded exponential backoff for idempotent collaborator operations

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::ErrorClass;
use crate::providers::ProviderError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            factor: 2,
            jitter: true,
        }
    }
}

impl RetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * self.factor.saturating_pow(attempt.saturating_sub(1));
        if self.jitter {
            backoff + Duration::from_millis(rand::rng().random_range(0..250u64))
        } else {
            backoff
        }
    }
}

/// Run `operation` with bounded exponential backoff. Only transient failures
/// are retried; the operation must be idempotent on the collaborator side.
pub async fn retry_idempotent<T, F, Fut>(
    config: &RetryConfig,
    operation: F,
) -> Result<T, ProviderError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation recovered after retry");
                }
                return Ok(value);
            }
            Err(err) if err.code.class() == ErrorClass::Transient && attempt < config.max_attempts => {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt,
                    error.code = err.code.as_str(),
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
