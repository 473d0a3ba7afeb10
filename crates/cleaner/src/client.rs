//! Rate-limited, retrying wrapper around a completion provider.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use stackscan_core::{CompletionProvider, CompletionRequest, CompletionResponse, ServiceError};

use crate::retry::RetryPolicy;

/// Issues completion requests one at a time, enforcing a minimum spacing
/// between consecutive call starts and retrying transient failures with
/// backoff. Permanent failures surface immediately: they would recur for
/// every frame, and each retry burns billable tokens.
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    policy: RetryPolicy,
    min_interval: Duration,
    last_call_start: Mutex<Option<Instant>>,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn CompletionProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            min_interval: Duration::ZERO,
            last_call_start: Mutex::new(None),
        }
    }

    /// Enforce at least `interval` between consecutive call starts,
    /// independent of call outcome.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Send one request, retrying rate-limit and transient failures up to
    /// the policy's attempt bound.
    pub async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, ServiceError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.pace().await;

            match self.provider.complete(request).await {
                Ok(response) => {
                    info!(
                        provider = self.provider.name(),
                        model = %response.model,
                        tokens = response.tokens_used,
                        latency_ms = response.latency_ms,
                        attempt,
                        "Completion received"
                    );
                    return Ok(response);
                }
                Err(err) if err.is_retryable() && self.policy.should_retry(attempt) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        max = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Completion failed, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        error = %err,
                        "Completion failed, not retrying"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn pace(&self) {
        let mut last = self.last_call_start.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Pacing before next call");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
