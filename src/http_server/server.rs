//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::X_CONTENT_TYPE_OPTIONS, HeaderValue},
    middleware, Router,
};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::data::ListStore;
use crate::observability::Logger;

use super::batch_routes::batch_routes;
use super::config::HttpServerConfig;
use super::list_routes::list_routes;
use super::middleware::log_requests;
use super::observability_routes::{health_routes, observability_routes};

/// HTTP server for the attempt-list API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server backed by `store`
    pub fn new(config: HttpServerConfig, store: Arc<ListStore>) -> Self {
        let router = Self::build_router(&config, store);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, store: Arc<ListStore>) -> Router {
        let metrics = store.metrics();

        Router::new()
            .merge(health_routes())
            .nest("/observability", observability_routes(metrics.clone()))
            .merge(list_routes(store.clone()))
            .merge(batch_routes(store))
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(SetResponseHeaderLayer::overriding(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(middleware::from_fn_with_state(metrics, log_requests))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c
    pub async fn start(self) -> Result<(), io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?.to_string();
        Logger::info("SERVER_START", &[("addr", bound.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Logger::info("SERVER_STOP", &[("addr", bound.as_str())]);
        Ok(())
    }
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolve when `signal` fires. A signal that cannot be installed never
/// fires, so the server keeps running instead of stopping at once.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        Logger::error("SIGNAL_HANDLER_FAILED", &[("error", e.to_string().as_str())]);
        std::future::pending::<()>().await;
    }
}
