#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Outbound HTTP client for the identity gateway
//!
//! A hyper-based client with:
//! - rustls TLS with a selectable trust mode (system roots, PEM trust store, trust-all)
//! - A single keep-alive connection pool shared by every clone of the client
//! - Mandatory connect and response timeouts
//! - Static `Authorization` injection (basic or bearer)
//! - Default headers merged without overwriting caller-supplied ones
//!
//! No retries happen here; the gateway's resilience policy wraps each call.
//!
//! # Example
//!
//! ```ignore
//! use idgw_http::{AuthScheme, HttpClient};
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .connect_timeout(Duration::from_secs(5))
//!     .timeout(Duration::from_secs(30))
//!     .auth(AuthScheme::Bearer { token: "t".to_owned() })
//!     .default_header("x-client", "identity-gateway")
//!     .build()?;
//!
//! let response = client
//!     .post("https://orchestrator.internal/session/init")
//!     .header("content-type", "application/json")
//!     .body_bytes(payload)
//!     .send()
//!     .await?;
//! let body = if response.status().is_success() {
//!     response.bytes().await?
//! } else {
//!     response.preview().await
//! };
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    AuthScheme, DEFAULT_USER_AGENT, ERROR_BODY_PREVIEW_LIMIT, HttpClientConfig, TlsTrust,
    TransportSecurity,
};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{AuthLayer, AuthService, DefaultHeadersLayer, DefaultHeadersService};
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody};
