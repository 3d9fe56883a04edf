//! Request and response bodies
//!
//! Field names follow the JSON wire format (camelCase).

use serde::{Deserialize, Serialize};
use tt_core::{ChartSpec, DatasetId, DatasetSchema, Row};

/// Chat request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub dataset_id: String,
    #[serde(default)]
    pub question: String,
}

impl ChatRequest {
    pub fn new(dataset_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            question: question.into(),
        }
    }
}

/// Answer to a chat turn that ran a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnswer {
    pub answer_text: String,

    /// SQL as executed, including the appended row cap
    pub sql: String,

    /// Shaped result rows
    pub data: Vec<Row>,

    pub chart_spec: ChartSpec,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result of a chat turn: a clarification question or an answer, never both
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatResponse {
    Clarification {
        #[serde(rename = "clarificationQuestion")]
        clarification_question: String,
    },
    Answer(ChatAnswer),
}

impl ChatResponse {
    /// The answer, if this turn produced one
    pub fn answer(&self) -> Option<&ChatAnswer> {
        match self {
            ChatResponse::Answer(answer) => Some(answer),
            ChatResponse::Clarification { .. } => None,
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: DatasetId,
    pub schema: DatasetSchema,
    pub row_count: u64,
}

/// Status of a ready dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStatus {
    pub id: DatasetId,
    pub schema: DatasetSchema,
    pub row_count: u64,
    pub ready: bool,
}

/// Suggested starter questions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions {
    pub questions: Vec<String>,
}
