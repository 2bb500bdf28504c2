//! Identity gateway module configuration.

use crate::domain::resilience::Backoff;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Configuration problems detected before any transport is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Identity gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Which transport reaches the orchestrator. Fixed for the process lifetime.
    pub transport: TransportKind,
    pub invoke: InvokeConfig,
    pub http: HttpTransportConfig,
    pub resilience: ResilienceConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Invoke,
            invoke: InvokeConfig::default(),
            http: HttpTransportConfig::default(),
            resilience: ResilienceConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Check the sections the selected transport and the policy depend on.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.transport {
            TransportKind::Invoke => self.invoke.validate()?,
            TransportKind::Http => self.http.validate()?,
        }
        self.resilience.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Function invocation (AWS Lambda `Invoke`)
    #[default]
    Invoke,
    /// REST over HTTPS
    Http,
}

impl TransportKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoke => "invoke",
            Self::Http => "http",
        }
    }
}

// === Function invocation ===

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvokeConfig {
    /// Function name, ARN or alias of the orchestrator.
    pub function_name: String,
    pub invocation_type: InvocationType,
    pub log_type: LogType,
    pub region: String,
    /// Custom endpoint (e.g. a local emulator). Blank values and ARNs are ignored.
    pub endpoint_override: Option<String>,
    pub credentials: CredentialsConfig,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            function_name: "identity-orchestrator".to_owned(),
            invocation_type: InvocationType::RequestResponse,
            log_type: LogType::Tail,
            region: "us-east-1".to_owned(),
            endpoint_override: None,
            credentials: CredentialsConfig::Default,
        }
    }
}

impl InvokeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.function_name.trim().is_empty() {
            return Err(ConfigError::invalid(
                "gateway.invoke.function_name",
                "must not be blank",
            ));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::invalid("gateway.invoke.region", "must not be blank"));
        }
        if let CredentialsConfig::Static { access_key, .. } = &self.credentials
            && access_key.trim().is_empty()
        {
            return Err(ConfigError::invalid(
                "gateway.invoke.credentials.access_key",
                "must not be blank for static credentials",
            ));
        }
        Ok(())
    }

    /// Endpoint override to apply, if any.
    ///
    /// ARNs are identifiers, not endpoints, so an override that starts with
    /// `arn:` is dropped with a warning.
    #[must_use]
    pub fn effective_endpoint(&self) -> Option<&str> {
        let endpoint = self.endpoint_override.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }
        if endpoint.starts_with("arn:") {
            tracing::warn!(
                endpoint,
                "ignoring endpoint_override that looks like an ARN; using the regional endpoint"
            );
            return None;
        }
        Some(endpoint)
    }
}

/// How the remote function is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationType {
    /// Wait for the function result
    #[default]
    #[serde(alias = "RequestResponse")]
    RequestResponse,
    /// Fire and forget; no response payload comes back
    #[serde(alias = "Event")]
    Event,
}

/// Whether to ask for the tail of the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    #[default]
    #[serde(alias = "Tail", alias = "TAIL")]
    Tail,
    #[serde(alias = "None", alias = "NONE")]
    None,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "snake_case", deny_unknown_fields)]
pub enum CredentialsConfig {
    /// Standard AWS provider chain (env, profile, IMDS, ...)
    #[default]
    Default,
    Static {
        access_key: String,
        secret_key: SecretString,
    },
}

// === REST ===

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpTransportConfig {
    /// Orchestrator base URL; operation paths are appended to it.
    pub base_url: String,
    pub connect_timeout_ms: u64,
    /// Time allowed for the response head.
    pub read_timeout_ms: u64,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_ms: u64,
    pub max_body_size: usize,
    pub auth: AuthConfig,
    pub tls: TlsConfig,
    /// Added to every request unless already present; blank keys or values are skipped.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8443".to_owned(),
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_ms: 90_000,
            max_body_size: 1_048_576, // 1 MiB
            auth: AuthConfig::None,
            tls: TlsConfig::System,
            default_headers: BTreeMap::new(),
        }
    }
}

impl HttpTransportConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base_url.trim();
        let uri: http::Uri = base
            .parse()
            .map_err(|e| ConfigError::invalid("gateway.http.base_url", format!("{e}")))?;
        if !matches!(uri.scheme_str(), Some("http" | "https")) || uri.authority().is_none() {
            return Err(ConfigError::invalid(
                "gateway.http.base_url",
                "must be an absolute http(s) URL",
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "gateway.http.connect_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "gateway.http.read_timeout_ms",
                "must be greater than zero",
            ));
        }
        if let TlsConfig::TrustStore { path } = &self.tls
            && path.trim().is_empty()
        {
            return Err(ConfigError::invalid(
                "gateway.http.tls.path",
                "must not be blank for trust_store mode",
            ));
        }
        Ok(())
    }

    /// Whether the base URL uses plain HTTP.
    #[must_use]
    pub fn is_plain_http(&self) -> bool {
        self.base_url.trim().starts_with("http://")
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)]
pub enum AuthConfig {
    #[default]
    None,
    Basic {
        username: String,
        password: SecretString,
    },
    Bearer {
        token: SecretString,
    },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)]
pub enum TlsConfig {
    /// OS trust store
    #[default]
    System,
    /// PEM bundle; `file:` prefixes are accepted
    TrustStore { path: String },
    /// Trust every certificate and skip hostname checks
    Insecure,
}

impl TlsConfig {
    /// Trust-store location with any `file:` prefix removed.
    #[must_use]
    pub fn trust_store_path(&self) -> Option<PathBuf> {
        match self {
            Self::TrustStore { path } => {
                let path = path.trim();
                Some(PathBuf::from(path.strip_prefix("file:").unwrap_or(path)))
            }
            Self::System | Self::Insecure => None,
        }
    }
}

// === Resilience ===

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResilienceConfig {
    /// Policy name; dispatchers using the same name share one breaker.
    pub name: String,

    // === Timeout ===
    /// Budget for a single attempt in milliseconds.
    pub timeout_ms: u64,

    // === Retry ===
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    pub backoff: Backoff,

    // === Circuit Breaker ===
    /// Consecutive failures within `window_ms` that open the circuit.
    pub failure_threshold: u32,
    pub window_ms: u64,
    /// How long the circuit stays open before allowing trial calls.
    pub cooldown_ms: u64,
    pub half_open_max_calls: u32,
    /// Trial successes needed to close the circuit again.
    pub success_threshold: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            name: "orchestrator".to_owned(),
            timeout_ms: 3_000,
            max_attempts: 3,
            backoff: Backoff::default(),
            failure_threshold: 5,
            window_ms: 60_000,
            cooldown_ms: 30_000,
            half_open_max_calls: 1,
            success_threshold: 1,
        }
    }
}

impl ResilienceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("gateway.resilience.name", "must not be blank"));
        }
        let positive: [(&'static str, u64); 6] = [
            ("gateway.resilience.timeout_ms", self.timeout_ms),
            ("gateway.resilience.max_attempts", u64::from(self.max_attempts)),
            (
                "gateway.resilience.failure_threshold",
                u64::from(self.failure_threshold),
            ),
            ("gateway.resilience.window_ms", self.window_ms),
            (
                "gateway.resilience.half_open_max_calls",
                u64::from(self.half_open_max_calls),
            ),
            (
                "gateway.resilience.success_threshold",
                u64::from(self.success_threshold),
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }
        if !(self.backoff.multiplier.is_finite() && self.backoff.multiplier >= 1.0) {
            return Err(ConfigError::invalid(
                "gateway.resilience.backoff.multiplier",
                "must be a finite number >= 1.0",
            ));
        }
        Ok(())
    }
}

// === Secrets ===

/// Secret configuration value.
///
/// Never printed: `Debug`, `Display` and serialization all yield `[REDACTED]`.
/// The buffer is zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read-only access for building credentials. Do not log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for SecretString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}
