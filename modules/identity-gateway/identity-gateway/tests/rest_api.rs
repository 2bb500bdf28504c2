//! REST boundary tests against a fake gateway API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use chrono::DateTime;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use identity_gateway::api::rest::{ErrorResponse, router};
use identity_gateway::{
    FaultKind, GatewayError, IdentityGatewayApi, MdnValidateData, MdnValidateRequest,
    NonEmptyString, Operation, OtpForwardData, OtpForwardRequest, OtpRequest, OtpRequestData,
    OtpValidateData, OtpValidateRequest, ResponseEnvelope, SessionInitData, SessionInitRequest,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Answers every call with the same canned outcome and counts calls.
struct FakeGateway {
    failure: Option<GatewayError>,
    calls: Mutex<Vec<Operation>>,
}

impl FakeGateway {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: GatewayError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn reply<T>(&self, operation: Operation, data: T) -> Result<ResponseEnvelope<T>, GatewayError> {
        self.calls.lock().push(operation);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(ResponseEnvelope {
            status: NonEmptyString::new("OK").unwrap(),
            message: NonEmptyString::new("ok").unwrap(),
            data,
            timestamp: DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z").unwrap(),
        })
    }
}

#[async_trait]
impl IdentityGatewayApi for FakeGateway {
    async fn session_init(
        &self,
        req: SessionInitRequest,
    ) -> Result<ResponseEnvelope<SessionInitData>, GatewayError> {
        self.reply(
            Operation::SessionInit,
            SessionInitData {
                uuid: req.uuid,
                result_code: "0".to_owned(),
                result_message: "started".to_owned(),
            },
        )
    }

    async fn mdn_validate(
        &self,
        req: MdnValidateRequest,
    ) -> Result<ResponseEnvelope<MdnValidateData>, GatewayError> {
        self.reply(
            Operation::MdnValidate,
            MdnValidateData {
                uuid: req.uuid,
                result_code: "0".to_owned(),
                result_message: "eligible".to_owned(),
                msisdn: req.msisdn,
                line_type: "PREPAID".to_owned(),
                provider: "acme".to_owned(),
                eligible: true,
                line_status: "ACTIVE".to_owned(),
            },
        )
    }

    async fn otp_request(
        &self,
        req: OtpRequest,
    ) -> Result<ResponseEnvelope<OtpRequestData>, GatewayError> {
        self.reply(
            Operation::OtpRequest,
            OtpRequestData {
                uuid: req.uuid,
                result_code: "0".to_owned(),
                result_message: "sent".to_owned(),
            },
        )
    }

    async fn otp_validate(
        &self,
        req: OtpValidateRequest,
    ) -> Result<ResponseEnvelope<OtpValidateData>, GatewayError> {
        self.reply(
            Operation::OtpValidate,
            OtpValidateData {
                uuid: req.uuid,
                result_code: "0".to_owned(),
                result_message: "valid".to_owned(),
                redirect_url: "https://example.com/next".to_owned(),
            },
        )
    }

    async fn otp_forward(
        &self,
        req: OtpForwardRequest,
    ) -> Result<ResponseEnvelope<OtpForwardData>, GatewayError> {
        self.reply(
            Operation::OtpForward,
            OtpForwardData {
                uuid: req.uuid,
                result_code: "0".to_owned(),
                result_message: "forwarded".to_owned(),
            },
        )
    }
}

async fn post(api: Arc<FakeGateway>, path: &str, body: &str) -> (StatusCode, http::HeaderMap, Value) {
    let response = router(api)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_owned()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, value)
}

#[tokio::test]
async fn mdn_validate_returns_envelope() {
    let api = FakeGateway::ok();
    let (status, headers, body) = post(
        api.clone(),
        "/mdn/validate",
        r#"{"uuid":"u1","msisdn":"5555555555"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["data"]["lineStatus"], "ACTIVE");
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(*api.calls.lock(), vec![Operation::MdnValidate]);
}

#[tokio::test]
async fn every_operation_is_routed() {
    let api = FakeGateway::ok();
    let cases = [
        (
            "/session/init",
            json!({"uuid": "u1", "timestamp": "t", "msisdn": "5555555555"}),
        ),
        ("/mdn/validate", json!({"uuid": "u1", "msisdn": "5555555555"})),
        (
            "/otp/request",
            json!({"uuid": "u1", "timestamp": "t", "msisdn": "5555555555"}),
        ),
        (
            "/otp/validate",
            json!({"uuid": "u1", "timestamp": "t", "msisdn": "5555555555", "otp": "123456"}),
        ),
        (
            "/otp/forward",
            json!({"uuid": "u1", "timestamp": "t", "msisdn": "5555555555"}),
        ),
    ];

    for (path, body) in cases {
        let (status, _, _) = post(api.clone(), path, &body.to_string()).await;
        assert_eq!(status, StatusCode::OK, "{path}");
    }
    assert_eq!(*api.calls.lock(), Operation::ALL.to_vec());
}

#[tokio::test]
async fn invalid_msisdn_is_rejected_before_dispatch() {
    let api = FakeGateway::ok();
    let (status, _, body) = post(api.clone(), "/mdn/validate", r#"{"uuid":"u1","msisdn":"123"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(error.status, "BAD_REQUEST");
    assert!(!error.retryable);
    assert!(api.calls.lock().is_empty());
}

#[tokio::test]
async fn missing_field_is_validation_error() {
    let (status, _, body) = post(FakeGateway::ok(), "/otp/validate", r#"{"uuid":"u1"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (status, _, body) = post(FakeGateway::ok(), "/otp/request", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _, body) = post(FakeGateway::ok(), "/otp/unknown", "{}").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn open_circuit_maps_to_503_with_retry_after() {
    let api = FakeGateway::failing(GatewayError::circuit_open("orchestrator", Duration::from_secs(12)));
    let (status, headers, body) = post(api, "/mdn/validate", r#"{"uuid":"u1","msisdn":"5555555555"}"#).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(headers[header::RETRY_AFTER], "12");
    assert_eq!(body["code"], "CIRCUIT_OPEN");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn transport_timeout_maps_to_504() {
    let api = FakeGateway::failing(GatewayError::transport(
        Operation::SessionInit,
        FaultKind::Timeout,
        "attempt 3 timed out after 3000ms",
    ));
    let (status, _, body) = post(
        api,
        "/session/init",
        r#"{"uuid":"u1","timestamp":"t","msisdn":"5555555555"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "UPSTREAM_TIMEOUT");
}

#[tokio::test]
async fn upstream_client_error_keeps_status() {
    let api = FakeGateway::failing(GatewayError::remote(
        Operation::OtpValidate,
        "409",
        Some(409),
        Some("otp already used".to_owned()),
    ));
    let (status, _, body) = post(
        api,
        "/otp/validate",
        r#"{"uuid":"u1","timestamp":"t","msisdn":"5555555555","otp":"123456"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "CONFLICT");
    assert_eq!(body["code"], "UPSTREAM_4XX");
    assert_eq!(body["retryable"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("409"), "{message}");
    assert!(message.contains("otp already used"), "{message}");
}

#[tokio::test]
async fn function_error_detail_reaches_the_caller() {
    let api = FakeGateway::failing(GatewayError::remote(
        Operation::OtpRequest,
        "Unhandled",
        None,
        Some("IllegalStateException: otp store unavailable".to_owned()),
    ));
    let (status, _, body) = post(api, "/otp/request", r#"{"uuid":"u1","msisdn":"5555555555","timestamp":"t"}"#).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "BAD_GATEWAY");
    assert_eq!(body["code"], "UPSTREAM_5XX");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("otp store unavailable")
    );
}
