//! One chat turn: plan, guard, execute, shape, narrate

use crate::error::{PipelineError, PipelineResult};
use crate::service::Pipeline;
use crate::state::{Turn, TurnState};
use crate::wire::{ChatAnswer, ChatRequest, ChatResponse};
use tt_core::{shape_rows, ChartSpec, DatasetProfile, Plan, Row};
use tt_llm::prompts::{explainer_payload, planner_payload, EXPLAINER_SYSTEM, PLANNER_SYSTEM};
use tt_llm::{parse_plan, LlmError};
use tt_sql::ensure_row_limit;

/// Narration when the query matched nothing
pub const NO_ROWS_ANSWER: &str = "No rows match your question. Try rephrasing or relaxing filters.";

/// Warning attached to zero-row answers
pub const NO_ROWS_WARNING: &str = "No data returned";

/// Narration used when the explainer call fails or returns nothing
pub const FALLBACK_ANSWER: &str = "Results are ready. See the chart and data below.";

/// Attempts at the plan call, including the single retry
const PLAN_ATTEMPTS: usize = 2;

impl Pipeline {
    /// Answer a question about a ready dataset
    pub async fn chat(&self, request: &ChatRequest) -> PipelineResult<ChatResponse> {
        let question = request.question.trim();
        if request.dataset_id.trim().is_empty() || question.is_empty() {
            return Err(PipelineError::InputInvalid(
                "datasetId and question required".to_string(),
            ));
        }
        let dataset = self.ready_dataset(&request.dataset_id)?;

        let mut turn = Turn::new();
        let result = self
            .run_turn(&mut turn, question, &dataset.storage_path, &dataset.profile)
            .await;
        match &result {
            Ok(_) => turn.advance(TurnState::Done),
            Err(err) => turn.fail(err.code()),
        }
        log::debug!(
            "Chat turn on {} ended in {} after {} states",
            dataset.id,
            turn.state(),
            turn.history().len()
        );
        result
    }

    async fn run_turn(
        &self,
        turn: &mut Turn,
        question: &str,
        storage_path: &std::path::Path,
        profile: &DatasetProfile,
    ) -> PipelineResult<ChatResponse> {
        let plan = self.request_plan(question, profile).await?;
        turn.advance(TurnState::PlanReceived);

        let (sql, chart) = match plan {
            Plan::Clarification { question } => {
                turn.advance(TurnState::Clarifying);
                return Ok(ChatResponse::Clarification {
                    clarification_question: question,
                });
            }
            Plan::Execution {
                sql,
                chart,
                assumptions,
            } => {
                if !assumptions.is_empty() {
                    log::debug!("Plan assumptions: {}", assumptions.join("; "));
                }
                (sql, chart)
            }
        };

        turn.advance(TurnState::Validating);
        self.guard
            .evaluate(&sql)
            .into_result()
            .map_err(|reason| PipelineError::SqlRejected(reason.to_string()))?;
        let sql = ensure_row_limit(&sql, self.config.query.chat_row_limit);

        turn.advance(TurnState::Executing);
        let rows = self.executor.execute(storage_path, &sql).await?;

        if rows.is_empty() {
            return Ok(ChatResponse::Answer(ChatAnswer {
                answer_text: NO_ROWS_ANSWER.to_string(),
                sql,
                data: Vec::new(),
                chart_spec: chart,
                warnings: vec![NO_ROWS_WARNING.to_string()],
            }));
        }

        turn.advance(TurnState::Shaping);
        let chart = resolve_chart_fields(chart, &rows)?;
        let data = shape_rows(rows, &chart, &self.limits);

        turn.advance(TurnState::Narrating);
        let answer_text = self.narrate(question, &chart, &data).await;

        Ok(ChatResponse::Answer(ChatAnswer {
            answer_text,
            sql,
            data,
            chart_spec: chart,
            warnings: Vec::new(),
        }))
    }

    /// Ask the model for a plan, retrying once on transport or decode
    /// failures
    async fn request_plan(&self, question: &str, profile: &DatasetProfile) -> PipelineResult<Plan> {
        let payload = planner_payload(question, profile);
        let mut last_error = None;
        for attempt in 1..=PLAN_ATTEMPTS {
            let outcome = self
                .model
                .call(PLANNER_SYSTEM, &payload)
                .await
                .and_then(|text| parse_plan(&text));
            match outcome {
                Ok(plan) => return Ok(plan),
                Err(LlmError::InvalidPlan(message)) => {
                    return Err(PipelineError::InvalidPlan(message))
                }
                Err(err) => {
                    log::warn!("Plan attempt {attempt} failed: {err}");
                    last_error = Some(err);
                }
            }
        }
        Err(PipelineError::PlanUnavailable(
            last_error.map_or_else(String::new, |e| e.to_string()),
        ))
    }

    /// Narrate shaped rows; never fails the turn
    async fn narrate(&self, question: &str, chart: &ChartSpec, data: &[Row]) -> String {
        let payload = explainer_payload(question, chart, data);
        match self.model.call(EXPLAINER_SYSTEM, &payload).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                log::warn!("Narration was empty; using fallback text");
                FALLBACK_ANSWER.to_string()
            }
            Err(err) => {
                log::warn!("Narration failed, using fallback text: {err}");
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}

/// Point the chart's axes at actual result columns.
///
/// An exact name match wins; otherwise a case-insensitive match is
/// accepted and the column's real name is used.
pub fn resolve_chart_fields(mut chart: ChartSpec, rows: &[Row]) -> PipelineResult<ChartSpec> {
    let Some(first) = rows.first() else {
        return Ok(chart);
    };
    chart.x_key = resolve_column(&chart.x_key, first)?;
    chart.y_key = resolve_column(&chart.y_key, first)?;
    Ok(chart)
}

fn resolve_column(field: &str, row: &Row) -> PipelineResult<String> {
    if row.contains_key(field) {
        return Ok(field.to_string());
    }
    let lowered = field.to_lowercase();
    row.keys()
        .find(|column| column.to_lowercase() == lowered)
        .cloned()
        .ok_or_else(|| {
            let columns: Vec<&str> = row.keys().map(String::as_str).collect();
            PipelineError::InvalidPlan(format!(
                "chart field '{}' is not a result column (columns: {})",
                field,
                columns.join(", ")
            ))
        })
}
