//! REST handlers.
//!
//! Thin: extract, validate, call the gateway API, map errors.

use std::sync::Arc;

use axum::Json;
use axum::extract::Extension;
use axum::extract::rejection::JsonRejection;
use axum::http::Uri;
use identity_gateway_sdk::{
    IdentityGatewayApi, MdnValidateData, MdnValidateRequest, OtpForwardData, OtpForwardRequest,
    OtpRequest, OtpRequestData, OtpValidateData, OtpValidateRequest, ResponseEnvelope,
    SessionInitData, SessionInitRequest,
};

use super::error::{ApiError, ApiResult};
use super::validation::Validate;

type Gateway = Arc<dyn IdentityGatewayApi>;

fn accept<T: Validate>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    let Json(request) = body?;
    request.validate()?;
    Ok(request)
}

/// POST /session/init
pub async fn session_init(
    Extension(api): Extension<Gateway>,
    body: Result<Json<SessionInitRequest>, JsonRejection>,
) -> ApiResult<Json<ResponseEnvelope<SessionInitData>>> {
    let request = accept(body)?;
    Ok(Json(api.session_init(request).await?))
}

/// POST /mdn/validate
pub async fn mdn_validate(
    Extension(api): Extension<Gateway>,
    body: Result<Json<MdnValidateRequest>, JsonRejection>,
) -> ApiResult<Json<ResponseEnvelope<MdnValidateData>>> {
    let request = accept(body)?;
    Ok(Json(api.mdn_validate(request).await?))
}

/// POST /otp/request
pub async fn otp_request(
    Extension(api): Extension<Gateway>,
    body: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<Json<ResponseEnvelope<OtpRequestData>>> {
    let request = accept(body)?;
    Ok(Json(api.otp_request(request).await?))
}

/// POST /otp/validate
pub async fn otp_validate(
    Extension(api): Extension<Gateway>,
    body: Result<Json<OtpValidateRequest>, JsonRejection>,
) -> ApiResult<Json<ResponseEnvelope<OtpValidateData>>> {
    let request = accept(body)?;
    Ok(Json(api.otp_validate(request).await?))
}

/// POST /otp/forward
pub async fn otp_forward(
    Extension(api): Extension<Gateway>,
    body: Result<Json<OtpForwardRequest>, JsonRejection>,
) -> ApiResult<Json<ResponseEnvelope<OtpForwardData>>> {
    let request = accept(body)?;
    Ok(Json(api.otp_forward(request).await?))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
