use crate::client::{BufferedService, HttpClient};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::HttpResponse;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Method, Request, Uri};
use http_body_util::Full;
use std::task::Poll;
use tower::Service;

/// One outbound request under construction.
///
/// Invalid header input is remembered and reported by [`send`](Self::send)
/// so calls can be chained.
#[must_use = "a request is only sent by .send()"]
pub struct RequestBuilder {
    client: HttpClient,
    method: Method,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    error: Option<HttpError>,
}

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, method: Method, url: &str) -> Self {
        Self {
            client,
            method,
            url: url.to_owned(),
            headers: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_none() {
            match parse_header(name, value) {
                Ok(header) => self.headers.push(header),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Send the request and wait for the response head.
    ///
    /// Every status comes back as `Ok`; the body is read separately through
    /// [`HttpResponse`].
    ///
    /// # Errors
    /// A deferred header error, a rejected URL or scheme, a connect failure,
    /// the response timeout, or `Overloaded` when the request buffer is full.
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let uri = check_url(&self.url, self.client.transport_security)?;
        let mut request = Request::builder().method(self.method).uri(uri);
        for (name, value) in self.headers {
            request = request.header(name, value);
        }
        let request = request.body(Full::new(self.body))?;

        let mut service = self.client.service;
        reserve_slot(&mut service).await?;
        let inner = service.call(request).await.map_err(unbuffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.client.max_body_size,
        })
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HttpError> {
    Ok((HeaderName::try_from(name)?, HeaderValue::try_from(value)?))
}

/// Parse `url` and check its scheme against the client's transport security.
fn check_url(url: &str, security: TransportSecurity) -> Result<Uri, HttpError> {
    let invalid = |kind, reason: String| HttpError::InvalidUri {
        url: url.to_owned(),
        kind,
        reason,
    };

    let uri: Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| invalid(InvalidUriKind::ParseError, e.to_string()))?;
    if uri.authority().is_none() {
        return Err(invalid(
            InvalidUriKind::MissingAuthority,
            "missing host".to_owned(),
        ));
    }

    match (uri.scheme_str(), security) {
        (Some("https"), _) | (Some("http"), TransportSecurity::AllowInsecureHttp) => Ok(uri),
        (Some("http"), TransportSecurity::TlsOnly) => Err(HttpError::InvalidScheme {
            scheme: "http".to_owned(),
            reason: "client requires HTTPS".to_owned(),
        }),
        (Some(scheme), _) => Err(HttpError::InvalidScheme {
            scheme: scheme.to_owned(),
            reason: "only http and https are supported".to_owned(),
        }),
        (None, _) => Err(invalid(
            InvalidUriKind::MissingScheme,
            "missing scheme".to_owned(),
        )),
    }
}

/// Claim a buffer slot without waiting; a full buffer is `Overloaded`.
async fn reserve_slot(service: &mut BufferedService) -> Result<(), HttpError> {
    let ready = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None),
    })
    .await;

    match ready {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(unbuffer_error(e)),
        None => Err(HttpError::Overloaded),
    }
}

/// The buffer boxes inner errors; anything that is not ours means the worker died.
fn unbuffer_error(err: tower::BoxError) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(err) => *err,
        Err(other) => {
            tracing::error!(error = %other, "request buffer worker stopped");
            HttpError::ServiceClosed
        }
    }
}
