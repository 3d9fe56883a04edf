//! Error types for tt-core

use thiserror::Error;

/// Core error type for TableTalk
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Dataset id is not registered
    #[error("[C004] Dataset not found: {id}")]
    DatasetNotFound { id: String },

    /// C005: Dataset exists but ingestion has not completed
    #[error("[C005] Dataset not ready: {id}")]
    DatasetNotReady { id: String },

    /// C006: Dataset already transitioned to ready
    #[error("[C006] Dataset already ready: {id}")]
    DatasetAlreadyReady { id: String },

    /// C007: Dataset id already registered
    #[error("[C007] Duplicate dataset id: {id}")]
    DuplicateDataset { id: String },

    /// C008: IO error with file path context
    #[error("[C008] IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ConfigParseError {
            message: err.to_string(),
        }
    }
}
