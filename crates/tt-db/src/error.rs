//! Error types for tt-db

use thiserror::Error;

/// Storage operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// CSV loading error (D004)
    #[error("[D004] CSV load failed: {0}")]
    CsvError(String),

    /// Query did not settle before its timer (D005)
    #[error("[D005] Query timeout after {timeout_ms} ms")]
    QueryTimeout { timeout_ms: u64 },

    /// Internal error (D006)
    #[error("[D006] Internal storage error: {0}")]
    Internal(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants, so the message
        // is the only thing to classify on. Patterns stay narrow so that
        // function/type/binder errors are not reported as missing tables.
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
