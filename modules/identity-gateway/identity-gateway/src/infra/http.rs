//! REST transport: `POST <base-url><operation path>` with the bare request body.

use async_trait::async_trait;
use bytes::Bytes;
use identity_gateway_sdk::{FaultKind, Operation};
use idgw_http::{AuthScheme, HttpClient, HttpClientBuilder, HttpClientConfig, HttpError, TlsTrust, TransportSecurity};

use crate::config::{AuthConfig, HttpTransportConfig, TlsConfig};
use crate::domain::transport::{Framing, Transport, TransportFault, TransportResult};

pub struct HttpTransport {
    client: HttpClient,
    base_url: String,
}

impl HttpTransport {
    /// Build the pooled client described by `config`.
    ///
    /// # Errors
    /// TLS material that cannot be loaded, or invalid default headers.
    pub fn from_config(config: &HttpTransportConfig) -> Result<Self, HttpError> {
        let client = HttpClientBuilder::with_config(client_config(config)).build()?;
        Ok(Self::new(client, &config.base_url))
    }

    #[must_use]
    pub fn new(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        }
    }

    fn url_for(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url, operation.rest_path())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn framing(&self) -> Framing {
        Framing::Bare
    }

    async fn invoke(&self, operation: Operation, payload: Bytes) -> TransportResult {
        let url = self.url_for(operation);
        let response = match self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .body_bytes(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return TransportResult::TransportFault(fault_from(&err)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.preview().await;
            tracing::debug!(%url, status = status.as_u16(), "orchestrator returned non-success status");
            return TransportResult::RemoteFunctionError {
                code: status.as_u16().to_string(),
                http_status: Some(status.as_u16()),
                payload: body,
            };
        }

        match response.bytes().await {
            Ok(body) if body.iter().all(u8::is_ascii_whitespace) => TransportResult::TransportFault(
                TransportFault::new(FaultKind::EmptyResponse, "empty response body"),
            ),
            Ok(body) => TransportResult::Success(body),
            Err(err) => TransportResult::TransportFault(fault_from(&err)),
        }
    }
}

fn fault_from(err: &HttpError) -> TransportFault {
    let kind = match err {
        HttpError::Timeout(_) => FaultKind::Timeout,
        HttpError::Transport(_) | HttpError::Tls(_) | HttpError::ServiceClosed => FaultKind::Connect,
        HttpError::Overloaded => FaultKind::Throttled,
        _ => FaultKind::Other,
    };
    TransportFault::new(kind, err.to_string())
}

/// Translate module configuration into the outbound client configuration.
#[must_use]
pub fn client_config(config: &HttpTransportConfig) -> HttpClientConfig {
    let auth = match &config.auth {
        AuthConfig::None => AuthScheme::None,
        AuthConfig::Basic { username, password } => AuthScheme::Basic {
            username: username.clone(),
            password: password.expose().to_owned(),
        },
        AuthConfig::Bearer { token } => AuthScheme::Bearer {
            token: token.expose().to_owned(),
        },
    };

    let tls = match &config.tls {
        TlsConfig::System => TlsTrust::System,
        TlsConfig::TrustStore { .. } => config
            .tls
            .trust_store_path()
            .map_or(TlsTrust::System, |path| TlsTrust::TrustStore { path }),
        TlsConfig::Insecure => TlsTrust::InsecureTrustAll,
    };

    let transport = if config.is_plain_http() {
        tracing::warn!(base_url = %config.base_url, "orchestrator base URL uses plain HTTP");
        TransportSecurity::AllowInsecureHttp
    } else {
        TransportSecurity::TlsOnly
    };

    HttpClientConfig {
        connect_timeout: config.connect_timeout(),
        request_timeout: config.read_timeout(),
        max_body_size: config.max_body_size,
        transport,
        tls,
        auth,
        default_headers: config
            .default_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        pool_idle_timeout: Some(std::time::Duration::from_millis(config.pool_idle_timeout_ms)),
        pool_max_idle_per_host: config.pool_max_idle_per_host,
        ..HttpClientConfig::default()
    }
}
