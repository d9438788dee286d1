//! Concurrency and bounded waiting
//!
//! Concurrent increments against a file-backed pool never lose an update,
//! and neither an exhausted pool nor a locked database can block a caller
//! past its deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use iidy::data::{
    open_connection, schema, ConnectionPool, DatabaseConfig, ListStore, StoreErrorCode,
};
use rusqlite::{Connection, TransactionBehavior};
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig::new(dir.path().join("iidy.db")).with_pool_size(4)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let pool = ConnectionPool::open(&file_config(&dir)).unwrap();
    let store = Arc::new(ListStore::new(pool));
    store.insert_one("l", "hot").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..64 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.increment_one("l", "hot").await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 1);
    }

    assert_eq!(store.get_one("l", "hot").await.unwrap(), Some(64));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_batch_increments_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let pool = ConnectionPool::open(&file_config(&dir)).unwrap();
    let store = Arc::new(ListStore::new(pool));
    let items: Vec<String> = (0..50).map(|i| format!("item-{}", i)).collect();
    store.insert_batch("l", items.clone()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        let items = items.clone();
        handles.push(tokio::spawn(async move {
            store.increment_batch("l", items).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 50);
    }

    let page = store.get_batch("l", "", 100).await.unwrap();
    assert_eq!(page.len(), 50);
    assert!(page.iter().all(|entry| entry.attempts == 16));
}

#[tokio::test]
async fn test_exhausted_pool_surfaces_as_store_error() {
    let mut conn = Connection::open_in_memory().unwrap();
    schema::migrate(&mut conn).unwrap();
    let pool = Arc::new(ConnectionPool::from_connections(
        vec![conn],
        Duration::from_millis(50),
    ));
    let store = ListStore::new(Arc::clone(&pool));

    let held = pool.acquire().await.unwrap();
    let started = Instant::now();
    let err = store.get_one("l", "a").await.unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::PoolTimeout);
    assert!(started.elapsed() < Duration::from_secs(2));

    drop(held);
    assert_eq!(store.get_one("l", "a").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_locked_database_hits_the_deadline() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        busy_timeout: Duration::from_secs(1),
        ..file_config(&dir)
    };
    let pool = ConnectionPool::open(&config).unwrap();
    let store = ListStore::new(pool).with_op_timeout(Duration::from_millis(100));

    // Another writer holds the write lock for longer than the deadline.
    let mut blocker = open_connection(&config).unwrap();
    let tx = blocker
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();

    let started = Instant::now();
    let err = store.insert_one("l", "a").await.unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::DeadlineExceeded);
    assert!(started.elapsed() < Duration::from_millis(900));

    tx.rollback().unwrap();

    // The timed-out call still owns its connection; the others serve.
    assert_eq!(store.insert_one("l", "b").await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deadlines_only_interrupt_their_own_statement() {
    let dir = TempDir::new().unwrap();
    let pool = ConnectionPool::open(&file_config(&dir)).unwrap();
    let items: Vec<String> = (0..200).map(|i| format!("item-{:03}", i)).collect();
    ListStore::new(Arc::clone(&pool))
        .insert_batch("l", items.clone())
        .await
        .unwrap();

    // Deadlines short enough that some calls miss them while their
    // neighbours on the same connections keep going.
    let store = Arc::new(
        ListStore::new(Arc::clone(&pool)).with_op_timeout(Duration::from_micros(300)),
    );
    let mut handles = Vec::new();
    for i in 0..400 {
        let store = Arc::clone(&store);
        let item = items[i % items.len()].clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store.increment_one("l", &item).await.map(|_| ())
            } else {
                store.get_batch("l", &item, 50).await.map(|_| ())
            }
        }));
    }

    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            assert_eq!(
                err.code(),
                StoreErrorCode::DeadlineExceeded,
                "unexpected failure: {}",
                err
            );
        }
    }

    let relaxed = ListStore::new(pool);
    assert_eq!(relaxed.get_batch("l", "", 500).await.unwrap().len(), 200);
}
