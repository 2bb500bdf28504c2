use crate::config::{AuthScheme, HttpClientConfig, TlsTrust, TransportSecurity};
use crate::error::HttpError;
use crate::layers::{AuthLayer, DefaultHeadersLayer};
use crate::response::ResponseBody;
use crate::tls;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use tower::buffer::Buffer;
use tower::timeout::TimeoutLayer;
use tower::{ServiceBuilder, ServiceExt};

/// Builder for constructing an [`crate::HttpClient`] with a layered tower middleware stack.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Create a builder with a specific configuration
    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self { config }
    }

    /// Set the TCP connect timeout
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the response timeout (time until the response head arrives)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the user agent string
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the maximum response body size in bytes
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set the static authentication scheme
    #[must_use]
    pub fn auth(mut self, auth: AuthScheme) -> Self {
        self.config.auth = auth;
        self
    }

    /// Set the TLS trust mode
    #[must_use]
    pub fn tls(mut self, trust: TlsTrust) -> Self {
        self.config.tls = trust;
        self
    }

    /// Append one default header
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .push((name.into(), value.into()));
        self
    }

    /// Allow plain `http://` URLs
    ///
    /// **WARNING**: traffic is sent unencrypted. Use for local development and
    /// mock servers only.
    #[must_use]
    pub fn allow_insecure_http(mut self) -> Self {
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Set the idle timeout for pooled connections (`None` keeps them indefinitely)
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the maximum number of idle connections kept per host
    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Assemble the client.
    ///
    /// Needs a running tokio runtime: the request buffer spawns its worker.
    ///
    /// # Errors
    /// `Tls` when the trust mode yields no usable TLS configuration; a header
    /// error when credentials or default headers are not valid header values.
    pub fn build(self) -> Result<crate::HttpClient, HttpError> {
        let HttpClientConfig {
            connect_timeout,
            request_timeout,
            max_body_size,
            user_agent,
            transport,
            tls,
            auth,
            mut default_headers,
            buffer_capacity,
            pool_idle_timeout,
            pool_max_idle_per_host,
        } = self.config;

        if transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!("plain http:// allowed; orchestrator traffic may be unencrypted");
        }
        if tls == TlsTrust::InsecureTrustAll {
            tracing::warn!("TLS certificate and hostname verification disabled");
        }

        let connector = https_connector(&tls, transport, connect_timeout)?;
        let mut pool = Client::builder(TokioExecutor::new());
        // Without a timer hyper ignores the idle timeout
        pool.pool_timer(TokioTimer::new())
            .pool_idle_timeout(pool_idle_timeout)
            .pool_max_idle_per_host(pool_max_idle_per_host);
        let hyper_client = pool.build::<_, Full<Bytes>>(connector);

        // Appended last so an explicit default `user-agent` entry wins
        default_headers.push((http::header::USER_AGENT.as_str().to_owned(), user_agent));

        // Outer to inner: timeout, auth, default headers, pool.
        // Auth sits above the defaults so no default can replace credentials.
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(request_timeout))
            .layer(AuthLayer::try_new(&auth)?)
            .layer(DefaultHeadersLayer::try_new(default_headers)?)
            .service(hyper_client)
            .map_response(box_response_body)
            .map_err(move |e: tower::BoxError| map_tower_error(e, request_timeout))
            .boxed_clone();

        Ok(crate::HttpClient {
            service: Buffer::new(service, buffer_capacity.max(1)),
            max_body_size,
            transport_security: transport,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map tower errors to `HttpError` with the configured timeout duration
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }

    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

fn box_response_body<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}

/// rustls connector over a plain TCP connector that carries the connect timeout.
fn https_connector(
    trust: &TlsTrust,
    transport: TransportSecurity,
    connect_timeout: Duration,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let mut tcp = HttpConnector::new();
    tcp.enforce_http(false);
    tcp.set_connect_timeout(Some(connect_timeout));

    let builder = hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(tls::client_config(trust)?);
    let builder = match transport {
        TransportSecurity::AllowInsecureHttp => builder.https_or_http(),
        TransportSecurity::TlsOnly => builder.https_only(),
    };
    Ok(builder.enable_all_versions().wrap_connector(tcp))
}
