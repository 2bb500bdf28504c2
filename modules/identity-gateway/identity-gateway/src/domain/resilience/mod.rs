//! Circuit breaker, retry and per-attempt timeout for outbound calls.

mod circuit_breaker;
mod policy;
mod registry;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerSettings, CircuitState, Permit};
pub use policy::ResiliencePolicy;
pub use registry::ResilienceRegistry;
pub use retry::{Backoff, BackoffKind};
