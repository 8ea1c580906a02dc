//! One span per request, closed with its status and latency.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{Instrument, Span, debug, field, info, info_span, warn};

use super::request_id::RequestId;

/// Wraps the request in an `http_request` span.
///
/// Expects [`request_id_middleware`](super::request_id_middleware) to run
/// outside this one; without it the span's `request_id` stays empty.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let span = info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = field::Empty,
        status = field::Empty,
        latency_ms = field::Empty,
    );
    if let Some(id) = request.extensions().get::<RequestId>() {
        span.record("request_id", id.as_str());
    }

    let started = Instant::now();
    async move {
        debug!("Request received");
        let response = next.run(request).await;

        let status = response.status();
        let current = Span::current();
        current.record("status", status.as_u16());
        current.record("latency_ms", started.elapsed().as_millis() as u64);

        if status.is_server_error() {
            warn!("Request failed");
        } else {
            info!("Request completed");
        }
        response
    }
    .instrument(span)
    .await
}
