//! Operation models and the generic response envelope.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

// === Operations ===

/// One of the business actions the gateway forwards to the orchestrator.
///
/// Serializes as its wire name (`sessionInit`, `mdnValidate`, ...), which is
/// what the function-invocation envelope carries in its `operation` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    SessionInit,
    MdnValidate,
    OtpRequest,
    OtpValidate,
    OtpForward,
}

impl Operation {
    /// Every operation, in declaration order
    pub const ALL: [Operation; 5] = [
        Operation::SessionInit,
        Operation::MdnValidate,
        Operation::OtpRequest,
        Operation::OtpValidate,
        Operation::OtpForward,
    ];

    /// Name used on the wire and in logs
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::SessionInit => "sessionInit",
            Self::MdnValidate => "mdnValidate",
            Self::OtpRequest => "otpRequest",
            Self::OtpValidate => "otpValidate",
            Self::OtpForward => "otpForward",
        }
    }

    /// REST path, both on the gateway's inbound API and on the orchestrator
    #[must_use]
    pub const fn rest_path(self) -> &'static str {
        match self {
            Self::SessionInit => "/session/init",
            Self::MdnValidate => "/mdn/validate",
            Self::OtpRequest => "/otp/request",
            Self::OtpValidate => "/otp/validate",
            Self::OtpForward => "/otp/forward",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

// === Envelope ===

/// A string that is guaranteed to contain at least one non-whitespace character.
///
/// Deserializing a blank string fails, which makes blank envelope fields a
/// decode error rather than something to check afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Wrap `value`, rejecting blank input
    ///
    /// # Errors
    /// Returns the rejection reason when `value` is empty or whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, &'static str> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err("value must not be blank");
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized response returned by the orchestrator for every operation.
///
/// All four fields are mandatory. `status` and `message` must be non-blank,
/// `data` must be present and not `null`, and `timestamp` must be an RFC 3339
/// instant. Anything else fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub status: NonEmptyString,
    pub message: NonEmptyString,
    pub data: T,
    pub timestamp: DateTime<FixedOffset>,
}

// === Requests ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInitRequest {
    pub uuid: String,
    pub timestamp: String,
    pub msisdn: String,
}

/// MDN (mobile directory number) eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdnValidateRequest {
    pub uuid: String,
    pub msisdn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Channel the request originated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Journey the check belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

impl MdnValidateRequest {
    /// Minimal request with only the mandatory fields
    #[must_use]
    pub fn new(uuid: impl Into<String>, msisdn: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            msisdn: msisdn.into(),
            timestamp: None,
            source: None,
            flow: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    pub uuid: String,
    pub msisdn: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpValidateRequest {
    pub uuid: String,
    pub timestamp: String,
    pub msisdn: String,
    pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpForwardRequest {
    pub uuid: String,
    pub timestamp: String,
    pub msisdn: String,
}

// === Response data ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInitData {
    pub uuid: String,
    pub result_code: String,
    pub result_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdnValidateData {
    pub uuid: String,
    pub result_code: String,
    pub result_message: String,
    pub msisdn: String,
    /// e.g. `PREPAID`
    pub line_type: String,
    pub provider: String,
    pub eligible: bool,
    /// e.g. `ACTIVE`
    pub line_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequestData {
    pub uuid: String,
    pub result_code: String,
    pub result_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpValidateData {
    pub uuid: String,
    pub result_code: String,
    pub result_message: String,
    /// Where the client continues after a successful validation
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpForwardData {
    pub uuid: String,
    pub result_code: String,
    pub result_message: String,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_wire_names_match_serde() {
        for op in Operation::ALL {
            let serialized = serde_json::to_value(op).unwrap();
            assert_eq!(serialized, json!(op.wire_name()));
        }
    }

    #[test]
    fn test_rest_paths_are_distinct() {
        let mut paths: Vec<_> = Operation::ALL.iter().map(|op| op.rest_path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), Operation::ALL.len());
    }

    #[test]
    fn test_non_empty_string_rejects_blank() {
        assert!(NonEmptyString::new("").is_err());
        assert!(NonEmptyString::new(" \t").is_err());
        assert_eq!(NonEmptyString::new("OK").unwrap().as_str(), "OK");
    }

    #[test]
    fn test_envelope_requires_every_field() {
        let full = json!({
            "status": "OK",
            "message": "ok",
            "data": {"uuid": "u1", "resultCode": "0", "resultMessage": "OK"},
            "timestamp": "2025-01-01T10:00:00Z"
        });
        assert!(serde_json::from_value::<ResponseEnvelope<SessionInitData>>(full.clone()).is_ok());

        for field in ["status", "message", "data", "timestamp"] {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(field);
            assert!(
                serde_json::from_value::<ResponseEnvelope<SessionInitData>>(partial).is_err(),
                "missing {field} must not decode"
            );
        }
    }

    #[test]
    fn test_envelope_rejects_null_data_and_blank_status() {
        let null_data = json!({
            "status": "OK",
            "message": "ok",
            "data": null,
            "timestamp": "2025-01-01T10:00:00Z"
        });
        assert!(serde_json::from_value::<ResponseEnvelope<OtpForwardData>>(null_data).is_err());

        let blank_status = json!({
            "status": "  ",
            "message": "ok",
            "data": {"uuid": "u1", "resultCode": "0", "resultMessage": "OK"},
            "timestamp": "2025-01-01T10:00:00Z"
        });
        assert!(serde_json::from_value::<ResponseEnvelope<OtpForwardData>>(blank_status).is_err());
    }

    #[test]
    fn test_mdn_request_omits_absent_optionals() {
        let value = serde_json::to_value(MdnValidateRequest::new("u1", "5555555555")).unwrap();
        assert_eq!(value, json!({"uuid": "u1", "msisdn": "5555555555"}));
    }
}
