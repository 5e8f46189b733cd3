use poem::http::{StatusCode, header};
use poem::{Body, Endpoint, IntoResponse, Middleware, Request, Response, Result};
use poem_openapi::payload::Json;
use tokio::io::AsyncReadExt;

use crate::types::dto::common::ErrorResponse;

/// Caps request bodies before any handler buffers them
///
/// A declared `Content-Length` above the cap is refused with 413 without
/// reading the body. Bodies of unknown length are cut off after the cap,
/// so a streamed upload can never be buffered past it.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    max_bytes: u64,
}

impl BodyLimit {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes: max_bytes as u64,
        }
    }
}

impl<E: Endpoint> Middleware<E> for BodyLimit {
    type Output = BodyLimitEndpoint<E>;

    fn transform(&self, inner: E) -> Self::Output {
        BodyLimitEndpoint {
            inner,
            max_bytes: self.max_bytes,
        }
    }
}

pub struct BodyLimitEndpoint<E> {
    inner: E,
    max_bytes: u64,
}

fn declared_length(req: &Request) -> Option<u64> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn payload_too_large() -> Response {
    Json(ErrorResponse::new(
        "payload_too_large",
        "The request body is too large.",
    ))
    .with_status(StatusCode::PAYLOAD_TOO_LARGE)
    .into_response()
}

impl<E: Endpoint> Endpoint for BodyLimitEndpoint<E> {
    type Output = Response;

    async fn call(&self, mut req: Request) -> Result<Self::Output> {
        match declared_length(&req) {
            Some(length) if length > self.max_bytes => {
                tracing::warn!(
                    "Refused {} {} with a {} byte body (limit {})",
                    req.method(),
                    req.uri().path(),
                    length,
                    self.max_bytes
                );
                return Ok(payload_too_large());
            }
            Some(_) => {}
            None => {
                let body = req.take_body().into_async_read().take(self.max_bytes);
                req.set_body(Body::from_async_read(body));
            }
        }

        self.inner.call(req).await.map(IntoResponse::into_response)
    }
}
