//! Request encoding and response envelope decoding.

use bytes::Bytes;
use identity_gateway_sdk::{GatewayError, Operation, ResponseEnvelope};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::transport::Framing;

/// Longest remote error detail kept when the payload is not structured.
const DETAIL_PREVIEW_LIMIT: usize = 512;

#[derive(Serialize)]
struct RequestEnvelope<'a, T> {
    operation: Operation,
    request: &'a T,
}

/// Error payload written by a failed function runtime.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionErrorPayload {
    error_message: Option<String>,
    error_type: Option<String>,
}

/// JSON codec for orchestrator traffic. Stateless.
pub struct Codec;

impl Codec {
    /// Serialize `request` in the shape `framing` calls for.
    ///
    /// # Errors
    /// `EncodingFailure` if the value cannot be represented as JSON.
    pub fn encode<T: Serialize>(
        operation: Operation,
        request: &T,
        framing: Framing,
    ) -> Result<Bytes, GatewayError> {
        let encoded = match framing {
            Framing::Enveloped => serde_json::to_vec(&RequestEnvelope { operation, request }),
            Framing::Bare => serde_json::to_vec(request),
        };
        encoded
            .map(Bytes::from)
            .map_err(|e| GatewayError::encoding(operation, e.to_string()))
    }

    /// Parse response bytes into a complete envelope.
    ///
    /// # Errors
    /// `DecodingFailure` for blank input, malformed JSON, or an envelope with
    /// a missing, blank or null field.
    pub fn decode<T: DeserializeOwned>(
        operation: Operation,
        bytes: &[u8],
    ) -> Result<ResponseEnvelope<T>, GatewayError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(GatewayError::decoding(operation, "response body is empty"));
        }
        serde_json::from_slice(bytes).map_err(|e| GatewayError::decoding(operation, e.to_string()))
    }

    /// Human-readable detail for a remote failure payload.
    ///
    /// Function runtimes report `{"errorMessage": ..., "errorType": ...}`;
    /// anything else is kept as a bounded text preview. The payload is never
    /// interpreted as an envelope.
    #[must_use]
    pub fn describe_remote_error(payload: &[u8]) -> Option<String> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        if let Ok(FunctionErrorPayload {
            error_message,
            error_type,
        }) = serde_json::from_slice::<FunctionErrorPayload>(payload)
        {
            match (error_type, error_message) {
                (Some(kind), Some(message)) => return Some(format!("{kind}: {message}")),
                (None, Some(message)) => return Some(message),
                (Some(kind), None) => return Some(kind),
                (None, None) => {}
            }
        }
        let text = String::from_utf8_lossy(payload);
        let text = text.trim();
        let preview: String = text.chars().take(DETAIL_PREVIEW_LIMIT).collect();
        Some(preview)
    }
}
