use crate::error::HttpError;
use http::header::{HeaderName, HeaderValue};
use http::{Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that adds static headers to requests that do not already carry them.
///
/// The first writer wins: a header already on the request (set by the caller
/// or an outer layer such as [`crate::AuthLayer`]) is never overwritten, and
/// among the defaults themselves an earlier entry shadows a later one.
#[derive(Clone)]
pub struct DefaultHeadersLayer {
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl DefaultHeadersLayer {
    /// Create the layer from raw name/value pairs.
    ///
    /// Pairs with a blank name or blank value are skipped entirely.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` / `HttpError::InvalidHeaderValue`
    /// for non-blank entries that are not valid HTTP headers.
    pub fn try_new<I, K, V>(headers: I) -> Result<Self, HttpError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for (name, value) in headers {
            let (name, value) = (name.as_ref().trim(), value.as_ref().trim());
            if name.is_empty() || value.is_empty() {
                tracing::debug!(header = name, "skipping default header with blank name or value");
                continue;
            }
            parsed.push((HeaderName::try_from(name)?, HeaderValue::try_from(value)?));
        }

        Ok(Self {
            headers: parsed.into(),
        })
    }

    /// Number of headers the layer may add
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the layer adds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Service that merges default headers into requests
#[derive(Clone)]
pub struct DefaultHeadersService<S> {
    inner: S,
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        for (name, value) in self.headers.iter() {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}
