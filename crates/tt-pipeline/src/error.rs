//! Error types for tt-pipeline

use thiserror::Error;
use tt_core::CoreError;
use tt_db::DbError;

/// Failure of a pipeline operation
///
/// Each variant has a stable [`code`](PipelineError::code) that callers
/// can match on; the display text adds the underlying message.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// P001: Request is missing a field or carries an unusable value
    #[error("[P001] Invalid input: {0}")]
    InputInvalid(String),

    /// P002: Dataset id is not registered
    #[error("[P002] Dataset not found: {0}")]
    DatasetNotFound(String),

    /// P003: Dataset has not finished ingestion
    #[error("[P003] Dataset not ready: {0}")]
    DatasetNotReady(String),

    /// P004: Plan call failed twice
    #[error("[P004] Plan unavailable: {0}")]
    PlanUnavailable(String),

    /// P005: Plan is well-formed but unusable
    #[error("[P005] Invalid plan: {0}")]
    InvalidPlan(String),

    /// P006: SQL guard vetoed the plan's query
    #[error("[P006] SQL rejected: {0}")]
    SqlRejected(String),

    /// P007: Query failed in the engine
    #[error("[P007] Query failed: {0}")]
    QueryError(String),

    /// P008: Query did not finish in time
    #[error("[P008] Query timed out after {timeout_ms} ms")]
    QueryTimeout { timeout_ms: u64 },

    /// P009: Upload could not be stored or ingested
    #[error("[P009] Upload failed: {0}")]
    UploadFailed(String),

    /// P010: Suggestion call or decoding failed
    #[error("[P010] Suggestions unavailable: {0}")]
    SuggestionsUnavailable(String),
}

impl PipelineError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InputInvalid(_) => "INPUT_INVALID",
            PipelineError::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            PipelineError::DatasetNotReady(_) => "DATASET_NOT_READY",
            PipelineError::PlanUnavailable(_) => "PLAN_UNAVAILABLE",
            PipelineError::InvalidPlan(_) => "INVALID_PLAN",
            PipelineError::SqlRejected(_) => "SQL_REJECTED",
            PipelineError::QueryError(_) => "QUERY_ERROR",
            PipelineError::QueryTimeout { .. } => "QUERY_TIMEOUT",
            PipelineError::UploadFailed(_) => "UPLOAD_FAILED",
            PipelineError::SuggestionsUnavailable(_) => "SUGGESTIONS_UNAVAILABLE",
        }
    }
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DatasetNotFound { id } => PipelineError::DatasetNotFound(id),
            CoreError::DatasetNotReady { id } => PipelineError::DatasetNotReady(id),
            other => PipelineError::UploadFailed(other.to_string()),
        }
    }
}

impl From<DbError> for PipelineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::QueryTimeout { timeout_ms } => PipelineError::QueryTimeout { timeout_ms },
            other => PipelineError::QueryError(other.to_string()),
        }
    }
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
