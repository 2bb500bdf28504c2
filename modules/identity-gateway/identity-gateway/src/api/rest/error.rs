//! REST error mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use http::{HeaderValue, StatusCode, header};
use identity_gateway_sdk::{FaultKind, GatewayError};
use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status name, e.g. `BAD_REQUEST` or `BAD_GATEWAY`
    pub status: String,
    pub message: String,
    pub retryable: bool,
    pub code: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub enum ApiError {
    /// Well-formed JSON that breaks a field rule
    Validation(String),
    /// Body that is not JSON, or not JSON of the expected shape
    MalformedJson(String),
    NotFound(String),
    Gateway(GatewayError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Upper-snake name of a status code, falling back to the number.
fn status_name(status: StatusCode) -> String {
    status.canonical_reason().map_or_else(
        || status.as_u16().to_string(),
        |reason| {
            reason
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-')
                .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
                .collect()
        },
    )
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::Validation(e.body_text()),
            other => Self::MalformedJson(other.body_text()),
        }
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, bool, String) {
        match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", false, message.clone()),
            Self::MalformedJson(message) => (StatusCode::BAD_REQUEST, "MALFORMED_JSON", false, message.clone()),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND", false, message.clone()),
            Self::Gateway(err) => {
                let message = err.to_string();
                match err {
                    GatewayError::RemoteFunctionError {
                        http_status: Some(status),
                        ..
                    } if (400..500).contains(status) => (
                        StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST),
                        "UPSTREAM_4XX",
                        false,
                        message,
                    ),
                    GatewayError::RemoteFunctionError { .. } => {
                        (StatusCode::BAD_GATEWAY, "UPSTREAM_5XX", true, message)
                    }
                    GatewayError::TransportFault {
                        kind: FaultKind::Timeout,
                        ..
                    } => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT", true, message),
                    GatewayError::TransportFault { .. } => {
                        (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", true, message)
                    }
                    GatewayError::CircuitOpen { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "CIRCUIT_OPEN", true, message)
                    }
                    GatewayError::DecodingFailure { .. } => {
                        (StatusCode::BAD_GATEWAY, "UPSTREAM_BAD_RESPONSE", false, message)
                    }
                    GatewayError::EncodingFailure { .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "UNEXPECTED_ERROR",
                        false,
                        message,
                    ),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, retryable, message) = self.parts();

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), code, %message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), code, %message, "request rejected");
        }

        let body = ErrorResponse {
            status: status_name(status),
            message,
            retryable,
            code: code.to_owned(),
            timestamp: Utc::now(),
        };
        let mut response = (status, Json(body)).into_response();

        if let Some(retry_after) = self.gateway_retry_after() {
            // Whole seconds, rounded up, never zero
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

impl ApiError {
    fn gateway_retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::Gateway(err) => err.retry_after(),
            _ => None,
        }
    }
}
