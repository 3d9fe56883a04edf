//! Locked, blocking-safe access to dataset storage files

use crate::error::{DbError, DbResult};
use crate::lock::ResourceLock;
use crate::value::to_json;
use duckdb::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tt_core::Row;

/// An open connection to one storage file
///
/// Handles only exist inside [`StorageGateway::session`]; they are closed
/// before the session's lock is released.
pub struct StorageHandle {
    conn: Connection,
    path: PathBuf,
}

impl StorageHandle {
    fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    fn close(self) -> DbResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::ConnectionError(format!("close failed: {e}")))
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute one or more statements without results
    pub fn run(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Run a query and collect every row as a column-ordered JSON object
    pub fn query(&self, sql: &str) -> DbResult<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;

        // Column metadata is only available once the statement has run, so
        // rows are collected positionally first and keyed afterwards.
        let raw_rows: Vec<Vec<duckdb::types::Value>> = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                (0..col_count)
                    .map(|i| row.get::<_, duckdb::types::Value>(i))
                    .collect()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let column_names: Vec<String> = (0..stmt.column_count())
            .map(|i| stmt.column_name(i).map_or("?".to_string(), |v| v.to_string()))
            .collect();

        Ok(raw_rows
            .into_iter()
            .map(|values| {
                column_names
                    .iter()
                    .cloned()
                    .zip(values.into_iter().map(to_json))
                    .collect()
            })
            .collect())
    }

    /// Run a single-value query returning a 64-bit integer
    pub fn query_i64(&self, sql: &str) -> DbResult<i64> {
        self.conn
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .map_err(DbError::from)
    }
}

/// Entry point for every storage access
///
/// A session opens the file, runs the caller's work, and closes the file,
/// all while holding the path's [`ResourceLock`]. The blocking engine calls
/// run on tokio's blocking pool.
#[derive(Debug, Clone, Default)]
pub struct StorageGateway {
    lock: Arc<ResourceLock>,
}

impl StorageGateway {
    /// Gateway with its own lock and the given settling delay
    pub fn new(settle_delay: Duration) -> Self {
        Self::with_lock(Arc::new(ResourceLock::new(settle_delay)))
    }

    /// Gateway sharing an existing lock
    pub fn with_lock(lock: Arc<ResourceLock>) -> Self {
        Self { lock }
    }

    /// The lock guarding storage files
    pub fn lock(&self) -> &Arc<ResourceLock> {
        &self.lock
    }

    /// Open `path`, run `work`, and close the file under the path's lock.
    ///
    /// The file is closed whether or not `work` succeeds. A failed close
    /// after successful work is reported; after failed work the work error
    /// wins.
    ///
    /// The locked unit runs in its own task. Dropping the returned future
    /// stops waiting for the result but leaves the lock held until the
    /// file is closed.
    pub async fn session<F, T>(&self, path: &Path, work: F) -> DbResult<T>
    where
        F: FnOnce(&StorageHandle) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let lock = Arc::clone(&self.lock);
        let key = path.to_path_buf();
        tokio::spawn(async move {
            let owned = key.clone();
            lock.with_lock(&key, || async move {
                tokio::task::spawn_blocking(move || {
                    let handle = StorageHandle::open(&owned)?;
                    let result = work(&handle);
                    let closed = handle.close();
                    let value = result?;
                    closed?;
                    Ok(value)
                })
                .await
                .map_err(|e| DbError::Internal(format!("storage task failed: {e}")))?
            })
            .await
        })
        .await
        .map_err(|e| DbError::Internal(format!("storage session failed: {e}")))?
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
