//! Identity gateway API trait.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{
    MdnValidateData, MdnValidateRequest, OtpForwardData, OtpForwardRequest, OtpRequest,
    OtpRequestData, OtpValidateData, OtpValidateRequest, ResponseEnvelope, SessionInitData,
    SessionInitRequest,
};

/// Public API of the identity gateway.
///
/// One method per forwarded operation. Requests are expected to be validated
/// already; every method either returns a complete envelope or a classified
/// [`GatewayError`].
#[async_trait]
pub trait IdentityGatewayApi: Send + Sync {
    async fn session_init(
        &self,
        req: SessionInitRequest,
    ) -> Result<ResponseEnvelope<SessionInitData>, GatewayError>;

    async fn mdn_validate(
        &self,
        req: MdnValidateRequest,
    ) -> Result<ResponseEnvelope<MdnValidateData>, GatewayError>;

    async fn otp_request(
        &self,
        req: OtpRequest,
    ) -> Result<ResponseEnvelope<OtpRequestData>, GatewayError>;

    async fn otp_validate(
        &self,
        req: OtpValidateRequest,
    ) -> Result<ResponseEnvelope<OtpValidateData>, GatewayError>;

    async fn otp_forward(
        &self,
        req: OtpForwardRequest,
    ) -> Result<ResponseEnvelope<OtpForwardData>, GatewayError>;
}
