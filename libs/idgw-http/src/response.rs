use crate::config::ERROR_BODY_PREVIEW_LIMIT;
use crate::error::HttpError;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;

pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Response head plus a body that is read at most once, always bounded.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Overflow {
    Fail,
    Truncate,
}

impl HttpResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Read the whole body regardless of status.
    ///
    /// # Errors
    /// `BodyTooLarge` past the client's `max_body_size`, `Transport` if the
    /// connection breaks mid-body.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        let limit = self.max_body_size;
        collect(self.inner, limit, Overflow::Fail).await
    }

    /// First bytes of the body for diagnostics, typically of a non-2xx reply.
    ///
    /// Capped at [`ERROR_BODY_PREVIEW_LIMIT`]; oversized or broken bodies
    /// yield whatever arrived before the cut.
    pub async fn preview(self) -> Bytes {
        let limit = self.max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);
        match collect(self.inner, limit, Overflow::Truncate).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "response body preview unavailable");
                Bytes::new()
            }
        }
    }
}

async fn collect(
    response: Response<ResponseBody>,
    limit: usize,
    overflow: Overflow,
) -> Result<Bytes, HttpError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut buf = BytesMut::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        let Some(chunk) = frame.data_ref() else {
            continue;
        };
        let total = buf.len() + chunk.len();
        if total > limit {
            if overflow == Overflow::Truncate {
                buf.extend_from_slice(&chunk[..limit - buf.len()]);
                break;
            }
            return Err(HttpError::BodyTooLarge {
                limit,
                actual: total,
            });
        }
        buf.extend_from_slice(chunk);
    }

    Ok(buf.freeze())
}
