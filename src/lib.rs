//! iidy - durable attempt lists
//!
//! Named lists of item identifiers, each with an attempt counter, stored in
//! SQLite and served over HTTP. Items are paged in byte-wise order with a
//! keyset cursor, so listing a list of any size costs one index range scan
//! per page.

pub mod cli;
pub mod codec;
pub mod data;
pub mod http_server;
pub mod observability;
