use crate::config::AuthScheme;
use crate::error::HttpError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderValue, Request, Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that sets the `Authorization` header from a static [`AuthScheme`]
#[derive(Clone)]
pub struct AuthLayer {
    authorization: Option<HeaderValue>,
}

impl AuthLayer {
    /// Create the layer for the given scheme.
    ///
    /// Basic credentials with a blank username and a blank bearer token
    /// produce a layer that adds nothing.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the credentials cannot form a header value
    pub fn try_new(scheme: &AuthScheme) -> Result<Self, HttpError> {
        let raw = match scheme {
            AuthScheme::None => None,
            AuthScheme::Basic { username, password } if !username.trim().is_empty() => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                Some(format!("Basic {encoded}"))
            }
            AuthScheme::Bearer { token } if !token.trim().is_empty() => {
                Some(format!("Bearer {token}"))
            }
            AuthScheme::Basic { .. } | AuthScheme::Bearer { .. } => {
                tracing::warn!("auth scheme configured with blank credentials; no Authorization header will be sent");
                None
            }
        };

        let authorization = raw
            .map(|value| {
                let mut value = HeaderValue::try_from(value)?;
                value.set_sensitive(true);
                Ok::<_, HttpError>(value)
            })
            .transpose()?;

        Ok(Self { authorization })
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            authorization: self.authorization.clone(),
        }
    }
}

/// Service that sets the `Authorization` header on requests
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    authorization: Option<HeaderValue>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AuthService<S>
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
        if let Some(value) = &self.authorization {
            req.headers_mut()
                .insert(http::header::AUTHORIZATION, value.clone());
        }
        self.inner.call(req)
    }
}
