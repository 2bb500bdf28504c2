//! Identity Gateway SDK
//!
//! Public contract of the identity gateway: the five forwarded operations,
//! their request and data models, the generic [`ResponseEnvelope`], and the
//! closed [`GatewayError`] taxonomy every call resolves to.
//!
//! ## Usage
//!
//! ```ignore
//! use identity_gateway_sdk::{IdentityGatewayApi, MdnValidateRequest};
//!
//! let envelope = gateway
//!     .mdn_validate(MdnValidateRequest::new("u1", "5555555555"))
//!     .await?;
//! assert!(envelope.data.eligible);
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

pub use api::IdentityGatewayApi;

pub use error::{ErrorKind, FaultKind, GatewayError};

pub use models::{
    MdnValidateData, MdnValidateRequest, NonEmptyString, Operation, OtpForwardData,
    OtpForwardRequest, OtpRequest, OtpRequestData, OtpValidateData, OtpValidateRequest,
    ResponseEnvelope, SessionInitData, SessionInitRequest,
};
