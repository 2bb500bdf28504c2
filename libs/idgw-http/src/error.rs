use std::time::Duration;
use thiserror::Error;

/// Why a URL was rejected before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    ParseError,
    MissingAuthority,
    MissingScheme,
}

/// Errors from building, sending or reading an outbound request.
///
/// A non-2xx status is not an error at this level; callers inspect
/// [`crate::HttpResponse::status`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    #[error("failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// No response head within the response timeout
    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connect failure, reset, refused, broken body stream
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Trust material could not be turned into a TLS configuration
    #[error("TLS setup failed: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("response body exceeds {limit} bytes (read {actual})")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Request buffer full; the call was not queued
    #[error("client overloaded: request buffer full")]
    Overloaded,

    /// Buffer worker gone
    #[error("client unavailable: request worker stopped")]
    ServiceClosed,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        reason: String,
    },

    /// Scheme not permitted by the client's transport security
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
