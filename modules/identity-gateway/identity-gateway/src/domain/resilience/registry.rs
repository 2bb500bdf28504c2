use std::sync::Arc;

use dashmap::DashMap;

use super::policy::ResiliencePolicy;
use crate::config::ResilienceConfig;

/// Named resilience policies shared across dispatchers.
///
/// The first configuration registered under a name wins; later lookups with
/// the same name get the same policy and therefore the same breaker.
#[derive(Debug, Default)]
pub struct ResilienceRegistry {
    policies: DashMap<String, Arc<ResiliencePolicy>>,
}

impl ResilienceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get_or_create(&self, config: &ResilienceConfig) -> Arc<ResiliencePolicy> {
        self.policies
            .entry(config.name.clone())
            .or_insert_with(|| {
                tracing::debug!(policy = %config.name, "registering resilience policy");
                Arc::new(ResiliencePolicy::from_config(config))
            })
            .clone()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ResiliencePolicy>> {
        self.policies.get(name).map(|entry| Arc::clone(entry.value()))
    }
}
