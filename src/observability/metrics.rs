//! Metrics registry
//!
//! Counters only, monotonic, reset on process start. Relaxed atomics: the
//! numbers are exact per counter but not a consistent cut across counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by the store and the HTTP layer
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests: AtomicU64,
    items_added: AtomicU64,
    items_deleted: AtomicU64,
    items_incremented: AtomicU64,
    pages_served: AtomicU64,
    store_failures: AtomicU64,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub items_added: u64,
    pub items_deleted: u64,
    pub items_incremented: u64,
    pub pages_served: u64,
    pub store_failures: u64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_items_added(&self, n: u64) {
        self.items_added.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_items_deleted(&self, n: u64) {
        self.items_deleted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_items_incremented(&self, n: u64) {
        self.items_incremented.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_pages_served(&self) {
        self.pages_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            items_added: self.items_added.load(Ordering::Relaxed),
            items_deleted: self.items_deleted.load(Ordering::Relaxed),
            items_incremented: self.items_incremented.load(Ordering::Relaxed),
            pages_served: self.pages_served.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.requests, 0);
        assert_eq!(snapshot.items_added, 0);
        assert_eq!(snapshot.store_failures, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.add_items_added(1234);
        registry.increment_requests();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["items_added"], 1234);
        assert_eq!(json["requests"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let r = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        r.add_items_incremented(1);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(registry.snapshot().items_incremented, 1000);
    }
}
