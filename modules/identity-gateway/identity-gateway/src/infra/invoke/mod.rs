//! Function-invocation transport.
//!
//! Sends the enveloped request to a named function and interprets the
//! runtime's reply: the function-error flag means the orchestrator itself
//! failed, a blank payload means nothing usable came back.

mod lambda;

pub use lambda::LambdaInvoker;

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use identity_gateway_sdk::{FaultKind, Operation};
use thiserror::Error;

use crate::config::{ConfigError, InvocationType, InvokeConfig, LogType};
use crate::domain::transport::{Framing, Transport, TransportFault, TransportResult};

#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub function_name: String,
    pub invocation_type: InvocationType,
    pub log_type: LogType,
    pub payload: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct InvocationOutput {
    pub status_code: i32,
    /// Set when the function ran but raised (`Unhandled`, `Handled`, ...)
    pub function_error: Option<String>,
    /// Base64 tail of the execution log, when requested
    pub log_result: Option<String>,
    pub payload: Option<Bytes>,
}

/// Failure of the invocation call itself, before any function result exists.
#[derive(Debug, Error)]
pub enum InvokeFault {
    #[error("could not reach the invocation endpoint: {0}")]
    Connect(String),
    #[error("invocation timed out: {0}")]
    Timeout(String),
    #[error("invocation throttled: {0}")]
    Throttled(String),
    #[error("invocation not authorized: {0}")]
    Unauthorized(String),
    #[error("invocation service error {code}: {message}")]
    Service { code: String, message: String },
    #[error("invocation failed: {0}")]
    Other(String),
}

impl InvokeFault {
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Connect(_) => FaultKind::Connect,
            Self::Timeout(_) => FaultKind::Timeout,
            Self::Throttled(_) => FaultKind::Throttled,
            Self::Unauthorized(_) => FaultKind::Unauthorized,
            Self::Service { .. } | Self::Other(_) => FaultKind::Other,
        }
    }
}

/// Client that can invoke a function by name.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutput, InvokeFault>;
}

pub struct InvokeTransport {
    invoker: Arc<dyn FunctionInvoker>,
    function_name: String,
    invocation_type: InvocationType,
    log_type: LogType,
}

impl InvokeTransport {
    /// # Errors
    /// `ConfigError` if the function name is blank.
    pub fn new(invoker: Arc<dyn FunctionInvoker>, config: &InvokeConfig) -> Result<Self, ConfigError> {
        let function_name = config.function_name.trim();
        if function_name.is_empty() {
            return Err(ConfigError::Invalid {
                field: "gateway.invoke.function_name",
                reason: "must not be blank".to_owned(),
            });
        }
        if config.invocation_type == InvocationType::Event {
            tracing::warn!(
                function = function_name,
                "event invocations return no payload; every call will surface as a transport fault"
            );
        }
        Ok(Self {
            invoker,
            function_name: function_name.to_owned(),
            invocation_type: config.invocation_type,
            log_type: config.log_type,
        })
    }

    fn log_tail(&self, operation: Operation, log_result: Option<&str>) {
        let Some(encoded) = log_result else {
            return;
        };
        match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(raw) => tracing::debug!(
                function = %self.function_name,
                operation = %operation,
                log_tail = %String::from_utf8_lossy(&raw),
                "function log tail"
            ),
            Err(e) => tracing::debug!(error = %e, "function log tail is not valid base64"),
        }
    }
}

#[async_trait]
impl Transport for InvokeTransport {
    fn name(&self) -> &'static str {
        "invoke"
    }

    fn framing(&self) -> Framing {
        Framing::Enveloped
    }

    async fn invoke(&self, operation: Operation, payload: Bytes) -> TransportResult {
        let request = InvocationRequest {
            function_name: self.function_name.clone(),
            invocation_type: self.invocation_type,
            log_type: self.log_type,
            payload,
        };

        let output = match self.invoker.invoke(request).await {
            Ok(output) => output,
            Err(fault) => {
                return TransportResult::TransportFault(TransportFault::new(fault.kind(), fault.to_string()));
            }
        };

        self.log_tail(operation, output.log_result.as_deref());

        if let Some(code) = output.function_error {
            return TransportResult::RemoteFunctionError {
                code,
                http_status: None,
                payload: output.payload.unwrap_or_default(),
            };
        }

        match output.payload {
            Some(payload) if !payload.iter().all(u8::is_ascii_whitespace) => TransportResult::Success(payload),
            _ => TransportResult::TransportFault(TransportFault::new(
                FaultKind::EmptyResponse,
                format!("empty response from function (status {})", output.status_code),
            )),
        }
    }
}
