use std::future::Future;
use std::time::Duration;

use identity_gateway_sdk::{FaultKind, GatewayError, Operation};

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerSettings, CircuitState};
use super::retry::Backoff;
use crate::config::ResilienceConfig;

/// Circuit breaker around retries around a per-attempt timeout.
///
/// The breaker admits or rejects a whole retry sequence and records its final
/// outcome once. Only transport faults and remote errors count as failures;
/// encoding and decoding failures leave the breaker untouched.
#[derive(Debug)]
pub struct ResiliencePolicy {
    name: String,
    breaker: CircuitBreaker,
    max_attempts: u32,
    attempt_timeout: Duration,
    backoff: Backoff,
}

impl ResiliencePolicy {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        breaker: CircuitBreakerSettings,
        max_attempts: u32,
        attempt_timeout: Duration,
        backoff: Backoff,
    ) -> Self {
        let name = name.into();
        Self {
            breaker: CircuitBreaker::new(name.clone(), breaker),
            name,
            max_attempts: max_attempts.max(1),
            attempt_timeout,
            backoff,
        }
    }

    #[must_use]
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            config.name.clone(),
            CircuitBreakerSettings {
                failure_threshold: config.failure_threshold,
                window: Duration::from_millis(config.window_ms),
                cooldown: Duration::from_millis(config.cooldown_ms),
                half_open_max_calls: config.half_open_max_calls,
                success_threshold: config.success_threshold,
            },
            config.max_attempts,
            Duration::from_millis(config.timeout_ms),
            config.backoff.clone(),
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Run `call` under the policy. `call` receives the 1-based attempt number
    /// and must perform a fresh transport call each time.
    ///
    /// # Errors
    /// `CircuitOpen` when the breaker rejects the call, otherwise the error of
    /// the last attempt.
    pub async fn execute<T, F, Fut>(&self, operation: Operation, mut call: F) -> Result<T, GatewayError>
    where
        F: FnMut(u32) -> Fut + Send,
        Fut: Future<Output = Result<T, GatewayError>> + Send,
        T: Send,
    {
        let permit = self.breaker.try_acquire().map_err(|retry_after| {
            tracing::warn!(
                policy = %self.name,
                operation = %operation,
                retry_after_ms = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
                "call rejected by open circuit"
            );
            GatewayError::circuit_open(self.name.clone(), retry_after)
        })?;

        let result = self.run_attempts(operation, &mut call).await;

        match &result {
            Ok(_) => permit.success(),
            Err(err) if err.is_retryable() => permit.failure(),
            Err(_) => permit.ignore(),
        }
        result
    }

    async fn run_attempts<T, F, Fut>(&self, operation: Operation, call: &mut F) -> Result<T, GatewayError>
    where
        F: FnMut(u32) -> Fut + Send,
        Fut: Future<Output = Result<T, GatewayError>> + Send,
        T: Send,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(self.attempt_timeout, call(attempt)).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(GatewayError::transport(
                    operation,
                    FaultKind::Timeout,
                    format!(
                        "attempt {attempt} timed out after {}ms",
                        self.attempt_timeout.as_millis()
                    ),
                )),
            };

            match outcome {
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff.delay_for_attempt(attempt - 1);
                    tracing::warn!(
                        policy = %self.name,
                        operation = %operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "attempt failed; retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                other => return other,
            }
        }
    }
}
