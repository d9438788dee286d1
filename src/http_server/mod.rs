//! # iidy HTTP Server Module
//!
//! Thin adapter between HTTP and the [`ListStore`](crate::data::ListStore).
//! Handlers parse, call one store operation, and render the result in the
//! encoding the request asked for.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/lists/{list}/{item}` - Single-item operations
//! - `/batch/lists/{list}` - Batch operations and paging
//! - `/observability/*` - Metrics and health

pub mod batch_routes;
pub mod config;
pub mod errors;
pub mod list_routes;
pub mod middleware;
pub mod negotiate;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use negotiate::LAST_ITEM_HEADER;
pub use server::HttpServer;
