//! Dispatcher behaviour under the resilience policy, against a scripted transport.

mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use common::{
    ScriptedTransport, dispatcher, envelope, fault, mdn_data, ok, resilience, result_data,
};
use identity_gateway::domain::resilience::CircuitState;
use identity_gateway::domain::transport::TransportResult;
use identity_gateway::{
    FaultKind, GatewayError, IdentityGatewayApi, IdentityGateway, MdnValidateData, MdnValidateRequest,
    Operation, OtpForwardData, OtpForwardRequest, OtpRequest, OtpRequestData, OtpValidateData,
    OtpValidateRequest, ResponseEnvelope, SessionInitData, SessionInitRequest,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

fn expected<T: DeserializeOwned>(body: &Value) -> ResponseEnvelope<T> {
    serde_json::from_value(body.clone()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn mdn_validate_recovers_after_one_fault() {
    let body = envelope(mdn_data());
    let transport = ScriptedTransport::new([fault(), ok(&body)]);
    let gateway = IdentityGateway::with_transport(transport.clone(), &resilience(3, 5));

    let envelope = gateway
        .api()
        .mdn_validate(MdnValidateRequest::new("u1", "5555555555"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 2);
    assert_eq!(envelope, expected(&body));
    assert_eq!(envelope.status.as_str(), "OK");
    assert!(envelope.data.eligible);
    assert_eq!(
        transport.last_payload().unwrap(),
        json!({"operation": "mdnValidate", "request": {"uuid": "u1", "msisdn": "5555555555"}})
    );
}

#[tokio::test(start_paused = true)]
async fn every_operation_round_trips_its_envelope() {
    let mdn = envelope(mdn_data());
    let plain = envelope(result_data());
    let mut validate_data = result_data();
    validate_data["redirectUrl"] = json!("https://example.com/next");
    let validate = envelope(validate_data);

    let transport = ScriptedTransport::new([
        ok(&plain),
        ok(&mdn),
        ok(&plain),
        ok(&validate),
        ok(&plain),
    ]);
    let gateway = IdentityGateway::with_transport(transport.clone(), &resilience(1, 5));
    let api = gateway.api();

    let session: ResponseEnvelope<SessionInitData> = api
        .session_init(SessionInitRequest {
            uuid: "u1".to_owned(),
            timestamp: "2025-01-01T10:00:00Z".to_owned(),
            msisdn: "5555555555".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(session, expected(&plain));

    let mdn_envelope: ResponseEnvelope<MdnValidateData> = api
        .mdn_validate(MdnValidateRequest::new("u1", "5555555555"))
        .await
        .unwrap();
    assert_eq!(mdn_envelope, expected(&mdn));

    let otp: ResponseEnvelope<OtpRequestData> = api
        .otp_request(OtpRequest {
            uuid: "u1".to_owned(),
            msisdn: "5555555555".to_owned(),
            timestamp: "2025-01-01T10:00:00Z".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(otp, expected(&plain));

    let validated: ResponseEnvelope<OtpValidateData> = api
        .otp_validate(OtpValidateRequest {
            uuid: "u1".to_owned(),
            timestamp: "2025-01-01T10:00:00Z".to_owned(),
            msisdn: "5555555555".to_owned(),
            otp: "123456".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(validated, expected(&validate));

    let forwarded: ResponseEnvelope<OtpForwardData> = api
        .otp_forward(OtpForwardRequest {
            uuid: "u1".to_owned(),
            timestamp: "2025-01-01T10:00:00Z".to_owned(),
            msisdn: "5555555555".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(forwarded, expected(&plain));

    assert_eq!(transport.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn malformed_envelope_is_decoding_failure_after_one_call() {
    let transport = ScriptedTransport::new([ok(&json!({"bad": true}))]);
    let dispatcher = dispatcher(transport.clone(), &resilience(3, 5));

    let err = dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &MdnValidateRequest::new("u1", "5555555555"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::DecodingFailure { .. }));
    assert_eq!(transport.calls(), 1);
    assert_eq!(dispatcher.policy().circuit_state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn encoding_failure_never_reaches_transport() {
    let transport = ScriptedTransport::new([]);
    let dispatcher = dispatcher(transport.clone(), &resilience(3, 1));

    let mut unrepresentable = BTreeMap::new();
    unrepresentable.insert((1, 2), "tuple keys are not JSON");

    let err = dispatcher
        .dispatch::<_, SessionInitData>(Operation::SessionInit, &unrepresentable)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::EncodingFailure { .. }));
    assert_eq!(transport.calls(), 0);
    assert_eq!(dispatcher.policy().circuit_state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn function_error_surfaces_after_retries() {
    let transport = ScriptedTransport::always(TransportResult::RemoteFunctionError {
        code: "Unhandled".to_owned(),
        http_status: None,
        payload: Bytes::from_static(br#"{"errorMessage":"boom","errorType":"RuntimeError"}"#),
    });
    let dispatcher = dispatcher(transport.clone(), &resilience(3, 5));

    let err = dispatcher
        .dispatch::<_, OtpRequestData>(
            Operation::OtpRequest,
            &OtpRequest {
                uuid: "u1".to_owned(),
                msisdn: "5555555555".to_owned(),
                timestamp: "2025-01-01T10:00:00Z".to_owned(),
            },
        )
        .await
        .unwrap_err();

    match err {
        GatewayError::RemoteFunctionError {
            operation,
            code,
            http_status,
            detail,
        } => {
            assert_eq!(operation, Operation::OtpRequest);
            assert_eq!(code, "Unhandled");
            assert_eq!(http_status, None);
            assert_eq!(detail.as_deref(), Some("RuntimeError: boom"));
        }
        other => panic!("expected remote function error, got {other:?}"),
    }
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn circuit_opens_then_admits_one_trial_after_cooldown() {
    let transport = ScriptedTransport::new([fault(), fault(), fault()]);
    let config = resilience(1, 3);
    let dispatcher = dispatcher(transport.clone(), &config);
    let request = MdnValidateRequest::new("u1", "5555555555");

    for _ in 0..3 {
        let err = dispatcher
            .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::TransportFault { .. }));
    }
    assert_eq!(transport.calls(), 3);
    assert_eq!(dispatcher.policy().circuit_state(), CircuitState::Open);

    let err = dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::CircuitOpen { .. }));
    assert!(err.retry_after().unwrap() > Duration::ZERO);
    assert_eq!(transport.calls(), 3);

    tokio::time::advance(Duration::from_millis(config.cooldown_ms)).await;

    // Script is exhausted: the trial gets the fallback fault and re-opens the circuit
    let err = dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::TransportFault { .. }));
    assert_eq!(transport.calls(), 4);
    assert_eq!(dispatcher.policy().circuit_state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn successful_trial_closes_circuit() {
    let body = envelope(mdn_data());
    let transport = ScriptedTransport::new([fault(), ok(&body), ok(&body)]);
    let config = resilience(1, 1);
    let dispatcher = dispatcher(transport.clone(), &config);
    let request = MdnValidateRequest::new("u1", "5555555555");

    let _ = dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
        .await;
    assert_eq!(dispatcher.policy().circuit_state(), CircuitState::Open);

    tokio::time::advance(Duration::from_millis(config.cooldown_ms)).await;

    dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
        .await
        .unwrap();
    assert_eq!(dispatcher.policy().circuit_state(), CircuitState::Closed);

    dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
        .await
        .unwrap();
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn blank_invoke_payload_is_transport_fault() {
    let transport = ScriptedTransport::always(TransportResult::TransportFault(
        identity_gateway::domain::transport::TransportFault::new(FaultKind::EmptyResponse, "empty response"),
    ));
    let dispatcher = dispatcher(transport.clone(), &resilience(2, 5));

    let err = dispatcher
        .dispatch::<_, OtpForwardData>(
            Operation::OtpForward,
            &OtpForwardRequest {
                uuid: "u1".to_owned(),
                timestamp: "2025-01-01T10:00:00Z".to_owned(),
                msisdn: "5555555555".to_owned(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::TransportFault {
            kind: FaultKind::EmptyResponse,
            ..
        }
    ));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn dispatchers_sharing_a_policy_name_share_the_breaker() {
    let transport = ScriptedTransport::always(fault());
    let gateway = IdentityGateway::with_transport(transport.clone(), &resilience(1, 1));
    let config = resilience(1, 1);

    let _ = gateway
        .api()
        .mdn_validate(MdnValidateRequest::new("u1", "5555555555"))
        .await;

    let shared = gateway.registry().get_or_create(&config);
    assert_eq!(shared.circuit_state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
#[tracing_test::traced_test]
async fn breaker_transitions_are_logged() {
    let transport = ScriptedTransport::always(fault());
    let dispatcher = dispatcher(transport, &resilience(1, 1));
    let request = MdnValidateRequest::new("u1", "5555555555");

    let _ = dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
        .await;
    let _ = dispatcher
        .dispatch::<_, MdnValidateData>(Operation::MdnValidate, &request)
        .await;

    assert!(logs_contain("circuit opened"));
    assert!(logs_contain("call rejected by open circuit"));
}
