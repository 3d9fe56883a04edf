//! Suggested starter questions

use crate::error::{PipelineError, PipelineResult};
use crate::service::Pipeline;
use crate::wire::Suggestions;
use tt_llm::parse_suggestions;
use tt_llm::prompts::{suggest_payload, SUGGEST_QUESTIONS_SYSTEM};

impl Pipeline {
    /// Ask the model for three questions worth asking about a ready dataset
    pub async fn suggest_questions(&self, raw_id: &str) -> PipelineResult<Suggestions> {
        let dataset = self.ready_dataset(raw_id)?;
        let payload = suggest_payload(&dataset.profile);
        let text = self
            .model
            .call(SUGGEST_QUESTIONS_SYSTEM, &payload)
            .await
            .map_err(|e| PipelineError::SuggestionsUnavailable(e.to_string()))?;
        let questions = parse_suggestions(&text)
            .map_err(|e| PipelineError::SuggestionsUnavailable(e.to_string()))?;
        Ok(Suggestions { questions })
    }
}
