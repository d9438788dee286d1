//! Bounded connection pool
//!
//! The pool is an explicit value handed to [`ListStore`](super::ListStore)
//! at construction. Checkout is async and bounded by `acquire_timeout`;
//! connections go back to the pool when the [`PooledConnection`] drops.

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::errors::{StoreError, StoreResult};
use super::schema;

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file
    pub path: PathBuf,
    /// Number of pooled connections
    pub pool_size: usize,
    /// Longest wait for a free connection
    pub acquire_timeout: Duration,
    /// Longest wait on an engine lock held by another connection
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool_size: 5,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }
}

/// Open one file-backed connection with the pool's engine settings.
pub fn open_connection(config: &DatabaseConfig) -> StoreResult<Connection> {
    let conn = Connection::open(&config.path)?;
    conn.busy_timeout(config.busy_timeout)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    })?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

/// A fixed set of open connections shared by the store
pub struct ConnectionPool {
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
    size: usize,
}

impl ConnectionPool {
    /// Open a file-backed pool and bring the schema up to date.
    pub fn open(config: &DatabaseConfig) -> StoreResult<Arc<Self>> {
        if config.pool_size == 0 {
            return Err(StoreError::engine("pool_size must be > 0"));
        }

        let mut connections = Vec::with_capacity(config.pool_size);
        for _ in 0..config.pool_size {
            connections.push(open_connection(config)?);
        }

        // Migrate through the first connection before anyone can check it out.
        schema::migrate(&mut connections[0])?;

        Ok(Arc::new(Self::from_connections(
            connections,
            config.acquire_timeout,
        )))
    }

    /// A private single-connection in-memory database.
    ///
    /// Every call yields an isolated database, which makes it the pool of
    /// choice for tests.
    pub fn in_memory() -> StoreResult<Arc<Self>> {
        let mut conn = Connection::open_in_memory()?;
        schema::migrate(&mut conn)?;
        Ok(Arc::new(Self::from_connections(
            vec![conn],
            Duration::from_secs(5),
        )))
    }

    /// Wrap already-open, already-migrated connections.
    pub fn from_connections(connections: Vec<Connection>, acquire_timeout: Duration) -> Self {
        let size = connections.len();
        Self {
            idle: Mutex::new(connections),
            permits: Arc::new(Semaphore::new(size)),
            acquire_timeout,
            size,
        }
    }

    /// Number of connections owned by the pool
    pub fn size(&self) -> usize {
        self.size
    }

    /// Connections not currently checked out
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Check out a connection, waiting at most `acquire_timeout`.
    pub async fn acquire(self: &Arc<Self>) -> StoreResult<PooledConnection> {
        let permit = tokio::time::timeout(
            self.acquire_timeout,
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await
        .map_err(|_| StoreError::pool_timeout(self.acquire_timeout))?
        .map_err(|e| StoreError::worker_failed(format!("connection pool closed: {}", e)))?;

        let conn = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or_else(|| StoreError::worker_failed("connection pool has no idle connection"))?;

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    fn release(&self, conn: Connection) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conn);
    }
}

/// A connection on loan from a [`ConnectionPool`]
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<ConnectionPool>,
    // Released after the connection is back in the idle list.
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("pooled connection used after release")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection used after release")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connection_returns_on_drop() {
        let pool = ConnectionPool::in_memory().unwrap();
        assert_eq!(pool.available(), 1);
        {
            let _conn = pool.acquire().await.unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_pool_times_out() {
        let conn = Connection::open_in_memory().unwrap();
        let pool = Arc::new(ConnectionPool::from_connections(
            vec![conn],
            Duration::from_millis(20),
        ));
        let _held = pool.acquire().await.unwrap();

        let err = pool.acquire().await.err().unwrap();
        assert_eq!(err.code(), crate::data::StoreErrorCode::PoolTimeout);
    }

    #[tokio::test]
    async fn test_in_memory_pools_are_isolated() {
        let a = ConnectionPool::in_memory().unwrap();
        let b = ConnectionPool::in_memory().unwrap();
        a.acquire()
            .await
            .unwrap()
            .execute("insert into lists (list, item) values ('l', 'x')", [])
            .unwrap();

        let count: i64 = b
            .acquire()
            .await
            .unwrap()
            .query_row("select count(*) from lists", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_file_pool_migrates() {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig::new(dir.path().join("iidy.db")).with_pool_size(3);
        let pool = ConnectionPool::open(&config).unwrap();
        assert_eq!(pool.size(), 3);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn test_zero_sized_pool_rejected() {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig::new(dir.path().join("iidy.db")).with_pool_size(0);
        assert!(ConnectionPool::open(&config).is_err());
    }
}
