//! Local client adapter implementing the SDK API trait.

use std::sync::Arc;

use async_trait::async_trait;
use identity_gateway_sdk::{
    GatewayError, IdentityGatewayApi, MdnValidateData, MdnValidateRequest, Operation,
    OtpForwardData, OtpForwardRequest, OtpRequest, OtpRequestData, OtpValidateData,
    OtpValidateRequest, ResponseEnvelope, SessionInitData, SessionInitRequest,
};
use tracing::instrument;

use crate::domain::dispatcher::OperationDispatcher;

/// [`IdentityGatewayApi`] backed by an in-process dispatcher.
pub struct GatewayLocalClient {
    dispatcher: Arc<OperationDispatcher>,
}

impl GatewayLocalClient {
    #[must_use]
    pub fn new(dispatcher: Arc<OperationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl IdentityGatewayApi for GatewayLocalClient {
    #[instrument(name = "identity_gateway.session_init", skip_all, fields(uuid = %req.uuid))]
    async fn session_init(
        &self,
        req: SessionInitRequest,
    ) -> Result<ResponseEnvelope<SessionInitData>, GatewayError> {
        self.dispatcher.dispatch(Operation::SessionInit, &req).await
    }

    #[instrument(name = "identity_gateway.mdn_validate", skip_all, fields(uuid = %req.uuid))]
    async fn mdn_validate(
        &self,
        req: MdnValidateRequest,
    ) -> Result<ResponseEnvelope<MdnValidateData>, GatewayError> {
        self.dispatcher.dispatch(Operation::MdnValidate, &req).await
    }

    #[instrument(name = "identity_gateway.otp_request", skip_all, fields(uuid = %req.uuid))]
    async fn otp_request(
        &self,
        req: OtpRequest,
    ) -> Result<ResponseEnvelope<OtpRequestData>, GatewayError> {
        self.dispatcher.dispatch(Operation::OtpRequest, &req).await
    }

    #[instrument(name = "identity_gateway.otp_validate", skip_all, fields(uuid = %req.uuid))]
    async fn otp_validate(
        &self,
        req: OtpValidateRequest,
    ) -> Result<ResponseEnvelope<OtpValidateData>, GatewayError> {
        self.dispatcher.dispatch(Operation::OtpValidate, &req).await
    }

    #[instrument(name = "identity_gateway.otp_forward", skip_all, fields(uuid = %req.uuid))]
    async fn otp_forward(
        &self,
        req: OtpForwardRequest,
    ) -> Result<ResponseEnvelope<OtpForwardData>, GatewayError> {
        self.dispatcher.dispatch(Operation::OtpForward, &req).await
    }
}
