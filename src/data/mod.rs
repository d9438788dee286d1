//! # List storage
//!
//! Durable attempt lists on top of a relational table keyed by
//! `(list, item)`. A list exists exactly as long as it has items.
//!
//! - [`ListStore`]: async, deadline-bound operations over a pooled database
//! - [`operations`]: the synchronous statements, generic over [`capability`]
//! - [`ConnectionPool`]: explicit, bounded pool injected into the store
//! - [`schema`]: embedded migrations
//!
//! Missing lists and items are never errors: lookups answer `None`, writes
//! report zero affected rows, pages come back short.

pub mod capability;
pub mod entry;
pub mod errors;
pub mod operations;
pub mod pool;
pub mod schema;
pub mod store;

pub use capability::{BulkLoader, Execer, Querier};
pub use entry::ListEntry;
pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use pool::{open_connection, ConnectionPool, DatabaseConfig, PooledConnection};
pub use store::{ListStore, DEFAULT_OP_TIMEOUT};
