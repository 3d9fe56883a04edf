//! Per-path serialization of storage operations
//!
//! Every operation on a dataset's storage file runs through
//! [`ResourceLock::with_lock`], keyed by the file path. Operations on one
//! path run strictly one at a time in submission order; operations on
//! different paths never wait on each other.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// Path-keyed FIFO lock with a settling delay between operations
///
/// Keys live for the process lifetime; their number is bounded by the number
/// of uploaded datasets.
#[derive(Debug, Default)]
pub struct ResourceLock {
    queues: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
    settle_delay: Duration,
}

impl ResourceLock {
    /// Create a lock that waits `settle_delay` after each operation before
    /// the next operation on the same path may start.
    ///
    /// The delay covers storage backends that release file handles some
    /// time after close returns. `Duration::ZERO` disables it.
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            settle_delay,
        }
    }

    /// Configured settling delay
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    fn queue(&self, key: &Path) -> Arc<AsyncMutex<()>> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(queues.entry(key.to_path_buf()).or_default())
    }

    /// Run `operation` once every earlier operation on `key` has finished.
    ///
    /// The operation's output, success or failure, is returned unchanged;
    /// a failed operation releases the lock like a successful one.
    ///
    /// Dropping the returned future releases the lock early. Callers that
    /// may stop waiting (for example on a timeout) must run this inside a
    /// spawned task so the lock is held until the operation really ends.
    pub async fn with_lock<F, Fut, T>(&self, key: &Path, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let queue = self.queue(key);
        // tokio's Mutex hands out the lock in FIFO order of lock() calls.
        let _guard = queue.lock().await;
        let result = operation().await;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        result
    }

    /// Number of distinct paths seen so far
    pub fn key_count(&self) -> usize {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
