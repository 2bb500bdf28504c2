//! Tower layers for the outbound request path
//!
//! - [`AuthLayer`] - Sets the static `Authorization` header
//! - [`DefaultHeadersLayer`] - Adds configured headers the request does not already carry

mod auth;
mod default_headers;

pub use auth::{AuthLayer, AuthService};
pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
