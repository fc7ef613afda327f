use super::service::DocumentationService;
use crate::error::{AttemptError, GenerationError, RetryClass};
use crate::rate_gate::RateGate;
use crate::spec::{EndpointDescriptor, SchemaInfo};
use crate::summary_cache::{cache_key, SummaryCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per endpoint, including the first.
    pub max_retries: u32,
    /// Base wait after a rate-limited attempt, multiplied by the attempt number.
    pub rate_limit_backoff: Duration,
    /// Base wait after any other failed attempt, multiplied by the attempt number.
    pub error_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            rate_limit_backoff: Duration::from_millis(2000),
            error_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Attempts per endpoint; a zero budget still makes one attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Wait after failed attempt number `attempt` (1-based), or `None` when it
    /// was the last one.
    pub fn delay_for(&self, attempt: u32, class: RetryClass) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            return None;
        }
        let base = match class {
            RetryClass::RateLimited => self.rate_limit_backoff,
            RetryClass::Transient => self.error_backoff,
        };
        Some(base * attempt)
    }
}

/// Generates one endpoint summary at a time: cache, then gate, then service,
/// with bounded retries.
///
/// Cheap to clone; the cache and gate are shared.
#[derive(Clone)]
pub struct GenerationClient {
    service: Arc<dyn DocumentationService>,
    cache: SummaryCache,
    gate: RateGate,
    policy: RetryPolicy,
    caller: Option<String>,
}

impl GenerationClient {
    pub fn new(
        service: Arc<dyn DocumentationService>,
        cache: SummaryCache,
        gate: RateGate,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            service,
            cache,
            gate,
            policy,
            caller: None,
        }
    }

    /// Identity presented to the rate gate. Unset means the global caller.
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Produce the summary for `endpoint`.
    ///
    /// A cache hit returns immediately without touching the gate or the
    /// service. Otherwise up to `max_retries` attempts are made, each one
    /// gate check then service call; successes are cached. A gate rejection
    /// counts as a rate-limited attempt and gets the long backoff.
    pub async fn generate(
        &self,
        endpoint: &EndpointDescriptor,
        schema_info: &SchemaInfo,
    ) -> Result<String, GenerationError> {
        let key = cache_key(endpoint);
        if let Some(summary) = self.cache.get(&key) {
            debug!(endpoint = %endpoint.key(), "Returning cached summary");
            return Ok(summary);
        }

        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let result = match self.gate.check(self.caller.as_deref()) {
                Ok(()) => self
                    .service
                    .summarize(endpoint, schema_info)
                    .await
                    .map_err(AttemptError::from),
                Err(rejected) => {
                    debug!(endpoint = %endpoint.key(), retry_after_secs = rejected.retry_after_secs, "Rate gate rejected generation");
                    Err(AttemptError::from(rejected))
                }
            };

            let err = match result {
                Ok(summary) => {
                    info!(endpoint = %endpoint.key(), attempt, service = self.service.name(), "Generated summary");
                    self.cache.put(key, summary.clone());
                    return Ok(summary);
                }
                Err(err) => err,
            };

            warn!(
                endpoint = %endpoint.key(),
                attempt,
                max_attempts,
                error = %err,
                "Generation attempt failed"
            );
            let class = err.retry_class();
            match self.policy.delay_for(attempt, class) {
                Some(delay) => {
                    debug!(delay_ms = delay.as_millis() as u64, ?class, "Backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    return Err(GenerationError::Exhausted {
                        attempts: attempt,
                        last: err,
                    })
                }
            }
        }
    }
}
