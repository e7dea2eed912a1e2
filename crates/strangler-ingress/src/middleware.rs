//! Shared ingress middleware

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info_span};
use uuid::Uuid;

/// Correlation header carried end to end
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Middleware to propagate or assign a request ID
///
/// An inbound `x-request-id` is kept as is. Otherwise a fresh UUID is added to
/// the request before it is forwarded, so the upstream sees the same ID the
/// caller gets back.
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let request_id = match req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty())
    {
        Some(existing) => existing.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            req.headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), generated.clone());
            generated
        }
    };

    let span = info_span!(
        "request",
        request_id = request_id.to_str().unwrap_or_default(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut response = next.run(req).instrument(span).await;

    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER.clone(), request_id);

    response
}
