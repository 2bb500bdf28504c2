//! Identity Gateway Module Implementation
//!
//! Forwards the five identity-verification operations (session init, MDN
//! validation, OTP request/validate/forward) to a downstream orchestrator
//! over one of two transports, under a shared resilience policy.
//!
//! ## Architecture
//!
//! ```text
//!        REST (/session/init, /mdn/validate, /otp/...)
//!                         │
//!                         ▼
//!              IdentityGatewayApi (local client)
//!                         │
//!                         ▼
//!   OperationDispatcher: encode ─▶ policy ─▶ transport ─▶ decode
//!                                    │
//!                  breaker ⊃ retry ⊃ per-attempt timeout
//!                                    │
//!                      ┌─────────────┴─────────────┐
//!                      ▼                           ▼
//!               InvokeTransport               HttpTransport
//!             (function invocation)          (REST over TLS)
//! ```

// === PUBLIC API (from SDK) ===
pub use identity_gateway_sdk::{
    ErrorKind, FaultKind, GatewayError, IdentityGatewayApi, MdnValidateData, MdnValidateRequest,
    NonEmptyString, Operation, OtpForwardData, OtpForwardRequest, OtpRequest, OtpRequestData,
    OtpValidateData, OtpValidateRequest, ResponseEnvelope, SessionInitData, SessionInitRequest,
};

// === MODULE DEFINITION ===
pub mod module;
pub use module::IdentityGateway;

// === LOCAL CLIENT ===
pub mod local_client;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

pub use config::GatewayConfig;
