//! # HTTP API Errors
//!
//! Everything a handler can fail with, and the status each maps to. Not
//! found is modelled here only because the wire needs a 404; the store
//! itself never reports it as an error.

use axum::http::StatusCode;
use axum::response::Response;
use thiserror::Error;

use crate::codec::{CodecError, Encoding, Reply};
use crate::data::StoreError;

use super::negotiate::respond;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Required query argument absent
    #[error("Query arg not found: {0}")]
    MissingParam(String),

    /// Query argument present but unusable
    #[error("{0}")]
    InvalidQueryParam(String),

    /// Batch payload could not be decoded
    #[error("Error trying to parse list of items from request body: {0}")]
    InvalidBody(#[from] CodecError),

    /// List or item absent
    #[error("Not found.")]
    NotFound,

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Store failure, with what the handler was trying to do. Rejected
    /// item identifiers are the one 400 in here.
    #[error("Error trying to {action}: {source}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Wrap a store failure with the action that was attempted
    pub fn store(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ApiError::Store { action, source }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidQueryParam(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store { source, .. } if source.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as a response in the negotiated encoding
    pub fn into_response(self, encoding: Encoding) -> Response {
        let status = self.status_code();
        respond(encoding, status, &Reply::Error(self.to_string()))
    }
}
