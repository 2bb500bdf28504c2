use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default User-Agent string for outbound requests
pub const DEFAULT_USER_AGENT: &str = concat!("idgw-http/", env!("CARGO_PKG_VERSION"));

/// Upper bound on the bytes returned by [`crate::HttpResponse::preview`]
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Which certificates the client trusts when it opens a TLS session.
///
/// The choice is fixed when the client is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsTrust {
    /// OS native root certificate store
    #[default]
    System,
    /// Only the CA certificates found in a PEM bundle on disk
    TrustStore {
        /// Path to the PEM file
        path: PathBuf,
    },
    /// Accept any server certificate and skip hostname verification.
    ///
    /// **WARNING**: for local testing against self-signed endpoints only.
    InsecureTrustAll,
}

/// Transport security configuration
///
/// Controls whether the client enforces TLS or allows plain HTTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// Require TLS for all connections (HTTPS only)
    #[default]
    TlsOnly,
    /// Allow plain HTTP connections (local development and mock servers)
    AllowInsecureHttp,
}

/// Static authentication applied to every request.
///
/// Exactly one scheme is active per client; it is never negotiated at runtime.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// No `Authorization` header
    #[default]
    None,
    /// `Authorization: Basic base64(username:password)`; skipped when the username is blank
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>`; skipped when the token is blank
    Bearer { token: String },
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Overall HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// TCP connect timeout (default: 5 seconds)
    pub connect_timeout: Duration,

    /// Time allowed for the response head after the request is sent (default: 30 seconds)
    pub request_timeout: Duration,

    /// Maximum response body size in bytes (default: 1 MB)
    pub max_body_size: usize,

    /// User-Agent header value, added only when the request has none
    pub user_agent: String,

    /// Transport security mode (default: `TlsOnly`)
    pub transport: TransportSecurity,

    /// TLS trust mode (default: `System`)
    pub tls: TlsTrust,

    /// Authentication scheme (default: `None`)
    pub auth: AuthScheme,

    /// Headers added to each request unless the request already carries them.
    ///
    /// Entries with a blank name or blank value are ignored.
    pub default_headers: Vec<(String, String)>,

    /// Buffer capacity for concurrent request handling (default: 1024)
    pub buffer_capacity: usize,

    /// Timeout for idle pooled connections (default: 90 seconds)
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum number of idle connections per host (default: 32)
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            tls: TlsTrust::System,
            auth: AuthScheme::None,
            default_headers: Vec::new(),
            buffer_capacity: 1024,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}
