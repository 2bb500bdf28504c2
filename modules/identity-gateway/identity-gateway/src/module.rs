//! Identity gateway module definition.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use identity_gateway_sdk::IdentityGatewayApi;
use tracing::info;

use crate::api::rest::routes;
use crate::config::{GatewayConfig, ResilienceConfig, TransportKind};
use crate::domain::dispatcher::OperationDispatcher;
use crate::domain::resilience::ResilienceRegistry;
use crate::domain::transport::Transport;
use crate::infra::http::HttpTransport;
use crate::infra::invoke::{InvokeTransport, LambdaInvoker};
use crate::local_client::GatewayLocalClient;

/// Identity gateway module.
///
/// Owns the transport chosen at startup, the named resilience policies and
/// the dispatcher behind the public API and the REST router.
pub struct IdentityGateway {
    registry: ResilienceRegistry,
    dispatcher: Arc<OperationDispatcher>,
    client: Arc<GatewayLocalClient>,
}

impl IdentityGateway {
    /// Validate `config`, build the configured transport and wire the module.
    ///
    /// # Errors
    /// Invalid configuration or a transport that cannot be built (e.g. an
    /// unreadable trust store).
    pub async fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        info!(transport = config.transport.as_str(), "Initializing identity gateway module");
        config.validate().context("invalid gateway configuration")?;

        let transport = build_transport(config).await?;
        let module = Self::with_transport(transport, &config.resilience);

        info!(
            transport = module.transport_name(),
            policy = %config.resilience.name,
            "Identity gateway module initialized"
        );
        Ok(module)
    }

    /// Wire the module around an already built transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, resilience: &ResilienceConfig) -> Self {
        let registry = ResilienceRegistry::new();
        let policy = registry.get_or_create(resilience);
        let dispatcher = Arc::new(OperationDispatcher::new(transport, policy));
        let client = Arc::new(GatewayLocalClient::new(Arc::clone(&dispatcher)));
        Self {
            registry,
            dispatcher,
            client,
        }
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn IdentityGatewayApi> {
        self.client.clone()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<OperationDispatcher> {
        &self.dispatcher
    }

    #[must_use]
    pub fn registry(&self) -> &ResilienceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn transport_name(&self) -> &'static str {
        self.dispatcher.transport_name()
    }

    #[must_use]
    pub fn router(&self) -> Router {
        routes::router(self.api())
    }
}

async fn build_transport(config: &GatewayConfig) -> anyhow::Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.transport {
        TransportKind::Invoke => {
            let invoker = LambdaInvoker::from_config(&config.invoke).await;
            Arc::new(InvokeTransport::new(Arc::new(invoker), &config.invoke)?)
        }
        TransportKind::Http => Arc::new(
            HttpTransport::from_config(&config.http)
                .context("failed to build orchestrator HTTP client")?,
        ),
    };
    Ok(transport)
}
