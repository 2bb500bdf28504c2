//! Identity gateway error taxonomy.
//!
//! Every outbound call ends in a value or exactly one of five failure kinds.

use crate::models::Operation;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EncodingFailure,
    TransportFault,
    RemoteFunctionError,
    DecodingFailure,
    CircuitOpenFailure,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EncodingFailure => "encoding_failure",
            Self::TransportFault => "transport_fault",
            Self::RemoteFunctionError => "remote_function_error",
            Self::DecodingFailure => "decoding_failure",
            Self::CircuitOpenFailure => "circuit_open",
        }
    }
}

/// What went wrong below the orchestrator's own logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Could not reach the orchestrator (DNS, refused, reset, TLS)
    Connect,
    /// An attempt exceeded its time budget
    Timeout,
    /// The call succeeded but carried no payload
    EmptyResponse,
    /// The invocation layer throttled the call
    Throttled,
    /// The invocation layer rejected our credentials
    Unauthorized,
    /// Anything else the transport could not classify
    Other,
}

/// Error type for identity gateway operations.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// The request could not be serialized; nothing was sent.
    #[error("failed to encode {operation} request: {message}")]
    EncodingFailure {
        operation: Operation,
        message: String,
    },

    /// Network, connectivity, timeout or empty-response failure.
    #[error("transport fault during {operation}: {message}")]
    TransportFault {
        operation: Operation,
        kind: FaultKind,
        message: String,
    },

    /// The orchestrator accepted the call but its own logic failed.
    ///
    /// `code` is the function-error tag for the invoke transport and the
    /// status code for the REST transport, which also sets `http_status`.
    /// `detail` is the function's error text or a preview of the reply body.
    #[error("orchestrator error during {operation}: {code}{}", detail_suffix(.detail.as_deref()))]
    RemoteFunctionError {
        operation: Operation,
        code: String,
        http_status: Option<u16>,
        detail: Option<String>,
    },

    /// Response bytes did not form a valid envelope.
    #[error("failed to decode {operation} response: {message}")]
    DecodingFailure {
        operation: Operation,
        message: String,
    },

    /// The circuit breaker rejected the call before it reached the transport.
    #[error("circuit '{policy}' is open; retry after {}ms", .retry_after.as_millis())]
    CircuitOpen { policy: String, retry_after: Duration },
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl GatewayError {
    /// Create an encoding failure.
    #[must_use]
    pub fn encoding(operation: Operation, message: impl Into<String>) -> Self {
        Self::EncodingFailure {
            operation,
            message: message.into(),
        }
    }

    /// Create a transport fault.
    #[must_use]
    pub fn transport(operation: Operation, kind: FaultKind, message: impl Into<String>) -> Self {
        Self::TransportFault {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Create a remote function error.
    #[must_use]
    pub fn remote(
        operation: Operation,
        code: impl Into<String>,
        http_status: Option<u16>,
        detail: Option<String>,
    ) -> Self {
        Self::RemoteFunctionError {
            operation,
            code: code.into(),
            http_status,
            detail,
        }
    }

    /// Create a decoding failure.
    #[must_use]
    pub fn decoding(operation: Operation, message: impl Into<String>) -> Self {
        Self::DecodingFailure {
            operation,
            message: message.into(),
        }
    }

    /// Create a circuit-open rejection.
    #[must_use]
    pub fn circuit_open(policy: impl Into<String>, retry_after: Duration) -> Self {
        Self::CircuitOpen {
            policy: policy.into(),
            retry_after,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EncodingFailure { .. } => ErrorKind::EncodingFailure,
            Self::TransportFault { .. } => ErrorKind::TransportFault,
            Self::RemoteFunctionError { .. } => ErrorKind::RemoteFunctionError,
            Self::DecodingFailure { .. } => ErrorKind::DecodingFailure,
            Self::CircuitOpen { .. } => ErrorKind::CircuitOpenFailure,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Only transport faults and remote errors qualify.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransportFault { .. } | Self::RemoteFunctionError { .. }
        )
    }

    /// Operation the failure belongs to, when known.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::EncodingFailure { operation, .. }
            | Self::TransportFault { operation, .. }
            | Self::RemoteFunctionError { operation, .. }
            | Self::DecodingFailure { operation, .. } => Some(*operation),
            Self::CircuitOpen { .. } => None,
        }
    }

    /// HTTP status reported by the orchestrator, if any.
    #[must_use]
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            Self::RemoteFunctionError { http_status, .. } => *http_status,
            _ => None,
        }
    }

    /// Remaining cooldown for an open circuit.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::CircuitOpen { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_retry_predicate_covers_transport_and_remote_only() {
        let op = Operation::OtpRequest;
        assert!(GatewayError::transport(op, FaultKind::Timeout, "elapsed").is_retryable());
        assert!(GatewayError::remote(op, "Unhandled", None, None).is_retryable());
        assert!(!GatewayError::encoding(op, "bad").is_retryable());
        assert!(!GatewayError::decoding(op, "missing field").is_retryable());
        assert!(!GatewayError::circuit_open("orchestrator", Duration::from_secs(3)).is_retryable());
    }

    #[test]
    fn test_kind_and_accessors() {
        let err = GatewayError::remote(Operation::MdnValidate, "404", Some(404), None);
        assert_eq!(err.kind(), ErrorKind::RemoteFunctionError);
        assert_eq!(err.remote_status(), Some(404));
        assert_eq!(err.operation(), Some(Operation::MdnValidate));

        let open = GatewayError::circuit_open("orchestrator", Duration::from_secs(5));
        assert_eq!(open.kind(), ErrorKind::CircuitOpenFailure);
        assert_eq!(open.retry_after(), Some(Duration::from_secs(5)));
        assert_eq!(open.operation(), None);
    }

    #[test]
    fn test_display_names_operation() {
        let err = GatewayError::transport(
            Operation::SessionInit,
            FaultKind::EmptyResponse,
            "empty response",
        );
        assert_eq!(
            err.to_string(),
            "transport fault during sessionInit: empty response"
        );
    }

    #[test]
    fn test_display_carries_remote_detail() {
        let err = GatewayError::remote(
            Operation::OtpValidate,
            "409",
            Some(409),
            Some("otp already used".to_owned()),
        );
        assert_eq!(
            err.to_string(),
            "orchestrator error during otpValidate: 409 (otp already used)"
        );

        let bare = GatewayError::remote(Operation::OtpValidate, "Unhandled", None, Some("  ".to_owned()));
        assert_eq!(bare.to_string(), "orchestrator error during otpValidate: Unhandled");
    }
}
