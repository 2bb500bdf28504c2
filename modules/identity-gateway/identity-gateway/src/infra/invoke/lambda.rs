//! AWS Lambda implementation of [`FunctionInvoker`].

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_lambda::Client;
use aws_sdk_lambda::config::retry::RetryConfig;
use aws_sdk_lambda::config::{Credentials, Region};
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types;
use bytes::Bytes;

use super::{FunctionInvoker, InvocationOutput, InvocationRequest, InvokeFault};
use crate::config::{CredentialsConfig, InvocationType, InvokeConfig, LogType};

const STATIC_PROVIDER_NAME: &str = "identity-gateway-static";

pub struct LambdaInvoker {
    client: Client,
}

impl LambdaInvoker {
    /// Resolve region, credentials and endpoint, then build the client.
    ///
    /// SDK-level retries are disabled; the resilience policy owns retrying.
    pub async fn from_config(config: &InvokeConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.trim().to_owned()));

        if let CredentialsConfig::Static {
            access_key,
            secret_key,
        } = &config.credentials
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.trim(),
                secret_key.expose(),
                None,
                None,
                STATIC_PROVIDER_NAME,
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_lambda::config::Builder::from(&shared).retry_config(RetryConfig::disabled());
        if let Some(endpoint) = config.effective_endpoint() {
            tracing::info!(endpoint, "using custom invocation endpoint");
            builder = builder.endpoint_url(endpoint);
        }

        tracing::info!(
            function = %config.function_name,
            region = %config.region,
            "lambda invoker ready"
        );
        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionInvoker for LambdaInvoker {
    async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutput, InvokeFault> {
        let invocation_type = match request.invocation_type {
            InvocationType::RequestResponse => types::InvocationType::RequestResponse,
            InvocationType::Event => types::InvocationType::Event,
        };
        let log_type = match request.log_type {
            LogType::Tail => types::LogType::Tail,
            LogType::None => types::LogType::None,
        };

        let output = self
            .client
            .invoke()
            .function_name(request.function_name)
            .invocation_type(invocation_type)
            .log_type(log_type)
            .payload(Blob::new(request.payload.to_vec()))
            .send()
            .await
            .map_err(|err| classify(&err))?;

        Ok(InvocationOutput {
            status_code: output.status_code(),
            function_error: output.function_error().map(str::to_owned),
            log_result: output.log_result().map(str::to_owned),
            payload: output.payload().map(|blob| Bytes::copy_from_slice(blob.as_ref())),
        })
    }
}

fn classify<E, R>(err: &SdkError<E, R>) -> InvokeFault
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let context = DisplayErrorContext(err).to_string();
    match err {
        SdkError::TimeoutError(_) => InvokeFault::Timeout(context),
        SdkError::DispatchFailure(failure) if failure.is_timeout() => InvokeFault::Timeout(context),
        SdkError::DispatchFailure(_) => InvokeFault::Connect(context),
        SdkError::ServiceError(_) => match err.code() {
            Some("TooManyRequestsException") => InvokeFault::Throttled(context),
            Some(
                "AccessDeniedException"
                | "UnrecognizedClientException"
                | "InvalidSignatureException"
                | "ExpiredTokenException",
            ) => InvokeFault::Unauthorized(context),
            code => InvokeFault::Service {
                code: code.unwrap_or("Unknown").to_owned(),
                message: err.message().unwrap_or_default().to_owned(),
            },
        },
        _ => InvokeFault::Other(context),
    }
}
