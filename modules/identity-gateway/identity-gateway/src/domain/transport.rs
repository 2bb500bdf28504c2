//! Transport abstraction: how encoded requests reach the orchestrator.

use async_trait::async_trait;
use bytes::Bytes;
use identity_gateway_sdk::{FaultKind, Operation};

/// Request shape a transport expects on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `{"operation": "<wireName>", "request": {...}}`
    Enveloped,
    /// The request body alone; the operation travels out of band (URL path).
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFault {
    pub kind: FaultKind,
    pub message: String,
}

impl TransportFault {
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a single transport call.
#[must_use]
#[derive(Debug, Clone)]
pub enum TransportResult {
    /// Raw response bytes, not yet validated.
    Success(Bytes),
    /// The orchestrator ran and reported a failure of its own.
    RemoteFunctionError {
        code: String,
        http_status: Option<u16>,
        payload: Bytes,
    },
    /// The call never produced an orchestrator result.
    TransportFault(TransportFault),
}

/// One strategy for delivering an operation to the orchestrator.
///
/// Implementations perform exactly one remote call per `invoke` and never
/// retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn framing(&self) -> Framing;

    async fn invoke(&self, operation: Operation, payload: Bytes) -> TransportResult;
}
