//! Operation dispatcher.
//!
//! Encodes a typed request once, sends it through the resilience policy and
//! the configured transport, and decodes the typed envelope that comes back.

use std::sync::Arc;
use std::time::Instant;

use identity_gateway_sdk::{GatewayError, Operation, ResponseEnvelope};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::codec::Codec;
use super::resilience::ResiliencePolicy;
use super::transport::{Transport, TransportResult};

pub struct OperationDispatcher {
    transport: Arc<dyn Transport>,
    policy: Arc<ResiliencePolicy>,
}

impl OperationDispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: Arc<ResiliencePolicy>) -> Self {
        Self { transport, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }

    #[must_use]
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Forward `request` as `operation` and decode the reply as `Data`.
    ///
    /// An encoding failure is returned before the breaker or the transport
    /// are touched. Each retry re-sends the same encoded bytes.
    ///
    /// # Errors
    /// One of the [`GatewayError`] kinds.
    pub async fn dispatch<Req, Data>(
        &self,
        operation: Operation,
        request: &Req,
    ) -> Result<ResponseEnvelope<Data>, GatewayError>
    where
        Req: Serialize + Sync,
        Data: DeserializeOwned + Send,
    {
        let payload = Codec::encode(operation, request, self.transport.framing()).inspect_err(|err| {
            tracing::error!(operation = %operation, error = %err, "request encoding failed");
        })?;

        let started = Instant::now();
        let result = self
            .policy
            .execute(operation, |attempt| {
                let transport = Arc::clone(&self.transport);
                let payload = payload.clone();
                async move {
                    tracing::debug!(
                        operation = %operation,
                        transport = transport.name(),
                        attempt,
                        bytes = payload.len(),
                        "invoking orchestrator"
                    );
                    let outcome = transport.invoke(operation, payload).await;
                    resolve(operation, outcome)
                }
            })
            .await;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(envelope) => tracing::info!(
                operation = %operation,
                status = %envelope.status,
                duration_ms,
                "operation completed"
            ),
            Err(err) => tracing::warn!(
                operation = %operation,
                kind = err.kind().as_str(),
                error = %err,
                duration_ms,
                "operation failed"
            ),
        }
        result
    }
}

fn resolve<Data: DeserializeOwned>(
    operation: Operation,
    outcome: TransportResult,
) -> Result<ResponseEnvelope<Data>, GatewayError> {
    match outcome {
        TransportResult::Success(bytes) => Codec::decode(operation, &bytes),
        TransportResult::RemoteFunctionError {
            code,
            http_status,
            payload,
        } => Err(GatewayError::remote(
            operation,
            code,
            http_status,
            Codec::describe_remote_error(&payload),
        )),
        TransportResult::TransportFault(fault) => {
            Err(GatewayError::transport(operation, fault.kind, fault.message))
        }
    }
}
