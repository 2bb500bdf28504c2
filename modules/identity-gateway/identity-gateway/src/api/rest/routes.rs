//! REST route registration.

use std::sync::Arc;

use axum::routing::post;
use axum::{Extension, Router};
use identity_gateway_sdk::{IdentityGatewayApi, Operation};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::handlers;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Router exposing the five operations, with request ids and request tracing.
#[must_use]
pub fn router(api: Arc<dyn IdentityGatewayApi>) -> Router {
    let router = Router::new()
        .route(Operation::SessionInit.rest_path(), post(handlers::session_init))
        .route(Operation::MdnValidate.rest_path(), post(handlers::mdn_validate))
        .route(Operation::OtpRequest.rest_path(), post(handlers::otp_request))
        .route(Operation::OtpValidate.rest_path(), post(handlers::otp_validate))
        .route(Operation::OtpForward.rest_path(), post(handlers::otp_forward))
        .fallback(handlers::not_found)
        .layer(Extension(api));

    // Layers run bottom-up: SetRequestId first, so the trace span sees the id
    router
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("n/a");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
