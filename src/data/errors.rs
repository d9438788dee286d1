//! List store error types
//!
//! Error codes:
//! - IIDY_STORE_ENGINE_FAILURE: the storage engine rejected or failed a statement
//! - IIDY_STORE_POOL_TIMEOUT: no pooled connection became free in time
//! - IIDY_STORE_DEADLINE_EXCEEDED: an operation ran past its deadline and was interrupted
//! - IIDY_STORE_WORKER_FAILED: the blocking worker running the statement died
//! - IIDY_STORE_INVALID_ITEM: an item identifier was rejected before reaching the engine
//!
//! "Not found" is never an error here. Engine errors are flattened to their
//! message text on the way in, so no engine type crosses this boundary.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    EngineFailure,
    PoolTimeout,
    DeadlineExceeded,
    WorkerFailed,
    InvalidItem,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::EngineFailure => "IIDY_STORE_ENGINE_FAILURE",
            StoreErrorCode::PoolTimeout => "IIDY_STORE_POOL_TIMEOUT",
            StoreErrorCode::DeadlineExceeded => "IIDY_STORE_DEADLINE_EXCEEDED",
            StoreErrorCode::WorkerFailed => "IIDY_STORE_WORKER_FAILED",
            StoreErrorCode::InvalidItem => "IIDY_STORE_INVALID_ITEM",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Opaque list store failure: a code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Storage engine failure (connectivity, constraint violation, bad SQL)
    pub fn engine(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::EngineFailure, message)
    }

    /// Pool checkout waited longer than allowed
    pub fn pool_timeout(waited: Duration) -> Self {
        Self::new(
            StoreErrorCode::PoolTimeout,
            format!("no database connection available after {}ms", waited.as_millis()),
        )
    }

    /// Operation interrupted after running past its deadline
    pub fn deadline_exceeded(operation: &str, deadline: Duration) -> Self {
        Self::new(
            StoreErrorCode::DeadlineExceeded,
            format!(
                "{} did not finish within {}ms and was interrupted",
                operation,
                deadline.as_millis()
            ),
        )
    }

    /// Blocking worker panicked or was cancelled
    pub fn worker_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::WorkerFailed, message)
    }

    /// Item identifier the store refuses to hold
    pub fn invalid_item(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidItem, message)
    }

    /// True when the caller sent something unusable, as opposed to a
    /// failure inside the store
    pub fn is_validation(&self) -> bool {
        self.code == StoreErrorCode::InvalidItem
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        // Keep the text, drop the type.
        Self::engine(err.to_string())
    }
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;
