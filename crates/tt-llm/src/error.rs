//! Error types for tt-llm

use thiserror::Error;

/// Model interaction errors
#[derive(Error, Debug)]
pub enum LlmError {
    /// API key variable unset or empty (L001)
    #[error("[L001] Model API key not set: environment variable {var} is empty or missing")]
    MissingApiKey { var: String },

    /// Request could not be sent or its body read (L002)
    #[error("[L002] Model request failed: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status (L003)
    #[error("[L003] Model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response carried no message content (L004)
    #[error("[L004] Model returned no content")]
    EmptyResponse,

    /// Response text is not JSON even after repair (L005)
    #[error("[L005] Model output is not valid JSON: {0}")]
    MalformedJson(String),

    /// JSON does not have the expected structure (L006)
    #[error("[L006] Model output has unexpected shape: {0}")]
    UnexpectedShape(String),

    /// Plan decoded but failed normalization (L007)
    #[error("[L007] Invalid plan: {0}")]
    InvalidPlan(String),

    /// Suggested questions decoded but are unusable (L008)
    #[error("[L008] Invalid suggested questions: {0}")]
    InvalidSuggestions(String),
}

impl LlmError {
    /// Whether repeating the identical call might succeed.
    ///
    /// Transport, parse, and structural failures depend on the model's
    /// output for one call; normalization failures are judgments about a
    /// well-formed plan and are final.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LlmError::InvalidPlan(_) | LlmError::InvalidSuggestions(_)
        )
    }
}

/// Result type alias for LlmError
pub type LlmResult<T> = Result<T, LlmError>;

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Transport(err.to_string())
    }
}
