//! Observability for iidy
//!
//! - Structured logging (JSON lines, deterministic key order)
//! - Operational counters, served at `/observability/metrics`
//!
//! ```ignore
//! use iidy::observability::{Logger, MetricsRegistry};
//!
//! Logger::info("SERVER_START", &[("addr", "0.0.0.0:8080")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.add_items_added(3);
//! ```

pub mod logger;
pub mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
