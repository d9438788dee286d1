//! ListStore: the async face of the list table
//!
//! Every call checks out a pooled connection, runs the blocking engine work
//! on tokio's blocking pool, and holds it to the store's deadline. When the
//! deadline passes, or the caller drops the future, the running statement is
//! interrupted through the connection's interrupt handle. The store keeps no
//! mutable state of its own and never retries.

use std::sync::Arc;
use std::time::Duration;

use rusqlite::{Connection, InterruptHandle};

use crate::observability::{Logger, MetricsRegistry};

use super::entry::ListEntry;
use super::errors::{StoreError, StoreResult};
use super::operations;
use super::pool::ConnectionPool;

/// Default deadline for a single store operation
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// Durable attempt lists backed by a connection pool
pub struct ListStore {
    pool: Arc<ConnectionPool>,
    metrics: Arc<MetricsRegistry>,
    op_timeout: Duration,
}

impl ListStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            metrics: Arc::new(MetricsRegistry::new()),
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Report into a shared metrics registry
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Deadline applied to each operation
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Add an item to a list. Fails if the item is already there.
    pub async fn insert_one(&self, list: &str, item: &str) -> StoreResult<u64> {
        operations::check_items([item])?;
        let (list, item) = (list.to_owned(), item.to_owned());
        let added = self
            .run("insert_one", move |conn| operations::insert_one(conn, &list, &item))
            .await?;
        self.metrics.add_items_added(added);
        Ok(added)
    }

    /// Attempt count of an item, or `None` if the list or item is missing.
    pub async fn get_one(&self, list: &str, item: &str) -> StoreResult<Option<i64>> {
        let (list, item) = (list.to_owned(), item.to_owned());
        self.run("get_one", move |conn| operations::get_one(conn, &list, &item))
            .await
    }

    /// Remove an item. Returns 0 when there was nothing to remove.
    pub async fn delete_one(&self, list: &str, item: &str) -> StoreResult<u64> {
        let (list, item) = (list.to_owned(), item.to_owned());
        let deleted = self
            .run("delete_one", move |conn| operations::delete_one(conn, &list, &item))
            .await?;
        self.metrics.add_items_deleted(deleted);
        Ok(deleted)
    }

    /// Bump an item's attempt count. Returns 0 when the item is missing.
    pub async fn increment_one(&self, list: &str, item: &str) -> StoreResult<u64> {
        let (list, item) = (list.to_owned(), item.to_owned());
        let incremented = self
            .run("increment_one", move |conn| {
                operations::increment_one(conn, &list, &item)
            })
            .await?;
        self.metrics.add_items_incremented(incremented);
        Ok(incremented)
    }

    /// Bulk-add items with zero attempts. An empty batch is a no-op.
    pub async fn insert_batch(&self, list: &str, items: Vec<String>) -> StoreResult<u64> {
        if items.is_empty() {
            return Ok(0);
        }
        operations::check_items(items.iter().map(String::as_str))?;
        let list = list.to_owned();
        let added = self
            .run("insert_batch", move |conn| {
                operations::insert_batch(conn, &list, &items)
            })
            .await?;
        self.metrics.add_items_added(added);
        Ok(added)
    }

    /// One page of a list in ascending item order, strictly after `after`.
    pub async fn get_batch(
        &self,
        list: &str,
        after: &str,
        count: usize,
    ) -> StoreResult<Vec<ListEntry>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let (list, after) = (list.to_owned(), after.to_owned());
        let entries = self
            .run("get_batch", move |conn| {
                operations::get_batch(conn, &list, &after, count)
            })
            .await?;
        self.metrics.increment_pages_served();
        Ok(entries)
    }

    /// Remove the listed items that exist. An empty batch is a no-op.
    pub async fn delete_batch(&self, list: &str, items: Vec<String>) -> StoreResult<u64> {
        if items.is_empty() {
            return Ok(0);
        }
        let list = list.to_owned();
        let deleted = self
            .run("delete_batch", move |conn| {
                operations::delete_batch(conn, &list, &items)
            })
            .await?;
        self.metrics.add_items_deleted(deleted);
        Ok(deleted)
    }

    /// Bump attempts on the listed items that exist. An empty batch is a no-op.
    pub async fn increment_batch(&self, list: &str, items: Vec<String>) -> StoreResult<u64> {
        if items.is_empty() {
            return Ok(0);
        }
        let list = list.to_owned();
        let incremented = self
            .run("increment_batch", move |conn| {
                operations::increment_batch(conn, &list, &items)
            })
            .await?;
        self.metrics.add_items_incremented(incremented);
        Ok(incremented)
    }

    /// Remove every list. Use with caution.
    pub async fn nuke(&self) -> StoreResult<u64> {
        self.run("nuke", |conn| operations::nuke(conn)).await
    }

    /// Run `work` on a pooled connection under the store deadline.
    async fn run<T, F>(&self, operation: &'static str, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let result = self.run_inner(operation, work).await;
        if let Err(err) = &result {
            self.metrics.increment_store_failures();
            Logger::error(
                "STORE_OPERATION_FAILED",
                &[
                    ("code", err.code_str()),
                    ("message", err.message()),
                    ("operation", operation),
                ],
            );
        }
        result
    }

    async fn run_inner<T, F>(&self, operation: &'static str, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.pool.acquire().await?;
        let handle = conn.get_interrupt_handle();
        // The connection travels back out with the result, so it only
        // rejoins the pool once the guard below can no longer fire.
        let mut task = tokio::task::spawn_blocking(move || {
            let result = work(&*conn);
            (result, conn)
        });
        // Declared after `task`: dropped first if this future is abandoned.
        let interrupt = InterruptOnDrop::new(handle);

        match tokio::time::timeout(self.op_timeout, &mut task).await {
            Ok(Ok((result, conn))) => {
                interrupt.disarm();
                drop(conn);
                result
            }
            Ok(Err(join_err)) => {
                interrupt.disarm();
                Err(StoreError::worker_failed(join_err.to_string()))
            }
            Err(_) => {
                // Interrupt while the task still owns the connection.
                drop(interrupt);
                drop(task);
                Err(StoreError::deadline_exceeded(operation, self.op_timeout))
            }
        }
    }
}

/// Interrupts the connection's running statement unless disarmed first.
///
/// Covers both an expired deadline and a caller that stops polling.
struct InterruptOnDrop {
    handle: Option<InterruptHandle>,
}

impl InterruptOnDrop {
    fn new(handle: InterruptHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    fn disarm(mut self) {
        self.handle = None;
    }
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.interrupt();
        }
    }
}
