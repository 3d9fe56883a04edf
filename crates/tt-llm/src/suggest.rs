//! Suggested-question decoding

use crate::error::{LlmError, LlmResult};
use crate::repair::parse_model_json;
use serde::Deserialize;

/// Number of questions a suggestion reply must contain
pub const SUGGESTION_COUNT: usize = 3;

#[derive(Deserialize)]
struct RawSuggestions {
    questions: Vec<String>,
}

/// Decode a suggestion reply into exactly [`SUGGESTION_COUNT`] questions
pub fn parse_suggestions(text: &str) -> LlmResult<Vec<String>> {
    let value = parse_model_json(text)?;
    let raw: RawSuggestions =
        serde_json::from_value(value).map_err(|e| LlmError::UnexpectedShape(e.to_string()))?;

    let questions: Vec<String> = raw
        .questions
        .iter()
        .map(|q| q.trim().to_string())
        .collect();
    if questions.len() != SUGGESTION_COUNT {
        return Err(LlmError::InvalidSuggestions(format!(
            "expected {} questions, got {}",
            SUGGESTION_COUNT,
            questions.len()
        )));
    }
    if questions.iter().any(String::is_empty) {
        return Err(LlmError::InvalidSuggestions(
            "questions must not be empty".to_string(),
        ));
    }
    Ok(questions)
}
