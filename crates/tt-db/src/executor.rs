//! Bounded query execution
//!
//! The executor appends a row cap to the statement, runs it in a storage
//! session, and gives up waiting after a timeout. A query that outlives its
//! timeout keeps the path's lock until the engine call actually returns, so
//! no later session can touch the file while it is still in use.

use crate::error::{DbError, DbResult};
use crate::gateway::StorageGateway;
use std::path::Path;
use std::time::Duration;
use tt_core::config::QueryConfig;
use tt_core::Row;
use tt_sql::ensure_row_limit;

/// Default result row cap
pub const DEFAULT_MAX_ROWS: usize = 5000;

/// Default query timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Limits applied to a single query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub max_rows: usize,
    pub timeout: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl From<&QueryConfig> for QueryOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            max_rows: config.max_rows,
            timeout: config.timeout(),
        }
    }
}

/// Runs read queries against dataset storage with a row cap and timeout
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    gateway: StorageGateway,
    options: QueryOptions,
}

impl QueryExecutor {
    pub fn new(gateway: StorageGateway, options: QueryOptions) -> Self {
        Self { gateway, options }
    }

    /// Default limits for this executor
    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Execute with the executor's default limits
    pub async fn execute(&self, path: &Path, sql: &str) -> DbResult<Vec<Row>> {
        self.execute_with(path, sql, self.options).await
    }

    /// Execute `sql` against the storage file at `path`.
    ///
    /// The returned rows never exceed `options.max_rows`, even when the
    /// statement carries a larger LIMIT of its own.
    pub async fn execute_with(
        &self,
        path: &Path,
        sql: &str,
        options: QueryOptions,
    ) -> DbResult<Vec<Row>> {
        let bounded = ensure_row_limit(sql, options.max_rows);
        log::debug!("Executing against {}: {}", path.display(), bounded);

        let session = self
            .gateway
            .session(path, move |db| db.query(&bounded));

        let mut rows = match tokio::time::timeout(options.timeout, session).await {
            Ok(result) => result?,
            Err(_) => {
                log::warn!(
                    "Query on {} exceeded {} ms",
                    path.display(),
                    options.timeout.as_millis()
                );
                return Err(DbError::QueryTimeout {
                    timeout_ms: u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        rows.truncate(options.max_rows);
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
