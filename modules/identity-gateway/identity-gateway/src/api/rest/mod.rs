//! Inbound REST surface: one POST endpoint per operation.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod validation;

pub use error::{ApiError, ErrorResponse};
pub use routes::router;
