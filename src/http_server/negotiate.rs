//! Content negotiation helpers shared by the list and batch routes

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::codec::{Encoding, Reply};

/// Header carrying the last item of a batch page
pub const LAST_ITEM_HEADER: &str = "x-iidy-last-item";

/// Encoding selected by the request's `Content-Type`
pub fn request_encoding(headers: &HeaderMap) -> Encoding {
    Encoding::from_content_type(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))
}

/// Render a reply with the matching `Content-Type`
pub fn respond(encoding: Encoding, status: StatusCode, reply: &Reply) -> Response {
    (
        status,
        [(CONTENT_TYPE, encoding.content_type())],
        reply.render(encoding),
    )
        .into_response()
}
