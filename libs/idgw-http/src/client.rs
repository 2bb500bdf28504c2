use crate::builder::HttpClientBuilder;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use tower::buffer::Buffer;

pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// Pooled outbound client.
///
/// Cheap to clone: every clone feeds the same request buffer and therefore
/// the same keep-alive pool.
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: BufferedService,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl HttpClient {
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Start a `POST` to `url`. Nothing is sent until [`RequestBuilder::send`].
    pub fn post(&self, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), http::Method::POST, url)
    }
}
