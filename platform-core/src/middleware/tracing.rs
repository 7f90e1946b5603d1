//! Request-id propagation for the platform's HTTP services.
//!
//! Every request gets a stable id for the duration of its handling: the
//! caller's `x-request-id` when one is supplied (and valid as a header
//! value), a fresh UUID otherwise. The id is recorded on the active request
//! span so it lands on every log line, and echoed back on the response so
//! callers can correlate.

use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Run inside the request span (layered under `TraceLayer`); the span must
/// declare an empty `request_id` field for the recording to take effect.
pub async fn propagate_request_id(mut req: Request, next: Next) -> Response {
    let request_id = match req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        Some(supplied) => supplied.to_string(),
        None => Uuid::new_v4().to_string(),
    };

    tracing::Span::current().record("request_id", request_id.as_str());

    // A supplied id has already survived header parsing, and a generated
    // UUID is always a valid header value, so this only fails for ids a
    // caller managed to sneak past `to_str` with exotic bytes.
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        req.headers_mut()
            .insert(REQUEST_ID_HEADER, header_value.clone());
        let mut response = next.run(req).await;
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
        response
    } else {
        next.run(req).await
    }
}
