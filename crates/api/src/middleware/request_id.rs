//! `x-request-id` correlation.
//!
//! An id supplied by a proxy is kept as is; otherwise a UUID v4 is minted.
//! Either way it lands on the `http_request` span, on the Sentry scope and
//! in the response headers.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn incoming_or_new(request: &Request) -> HeaderValue {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|value| !value.is_empty() && value.to_str().is_ok())
        .cloned()
        .unwrap_or_else(|| {
            // A hyphenated UUID is always a valid header value
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        })
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = incoming_or_new(&request);
    let id_str = id.to_str().unwrap_or_default();

    Span::current().record("request_id", id_str);
    sentry::configure_scope(|scope| scope.set_tag("request_id", id_str));

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), id);
    response
}
