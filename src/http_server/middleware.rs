//! Request logging middleware
//!
//! Every request gets an id, echoed back in `x-request-id`, and one
//! `HTTP_REQUEST` log line once the response is ready.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::observability::{Logger, MetricsRegistry, Severity};

/// Header carrying the per-request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Log one line per request and count it
pub async fn log_requests(
    State(metrics): State<Arc<MetricsRegistry>>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    metrics.increment_requests();
    let status = response.status();
    let duration_ms = started.elapsed().as_millis().to_string();

    let severity = if status.is_server_error() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(
        severity,
        "HTTP_REQUEST",
        &[
            ("duration_ms", duration_ms.as_str()),
            ("method", method.as_str()),
            ("path", path.as_str()),
            ("request_id", request_id.as_str()),
            ("status", status.as_str()),
        ],
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
