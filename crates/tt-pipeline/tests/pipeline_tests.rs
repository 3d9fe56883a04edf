//! Integration tests for the TableTalk pipeline

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tt_core::{ChartType, Config};
use tt_llm::prompts::{EXPLAINER_SYSTEM, PLANNER_SYSTEM, SUGGEST_QUESTIONS_SYSTEM};
use tt_llm::{LlmError, LlmResult, ModelClient};
use tt_pipeline::chat::{FALLBACK_ANSWER, NO_ROWS_ANSWER, NO_ROWS_WARNING};
use tt_pipeline::{ChatRequest, ChatResponse, Pipeline, PipelineError};

const SALES_CSV: &[u8] = include_bytes!("fixtures/sales.csv");

const BY_REGION_SQL: &str =
    "SELECT region, SUM(amount) AS total FROM data GROUP BY region ORDER BY total DESC, region";

/// Model double that replays a fixed script and records every call
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    fn new(replies: Vec<LlmResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::default(),
        })
    }

    fn systems(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(system, _)| system.clone())
            .collect()
    }

    fn last_user_payload(&self) -> Value {
        let calls = self.calls.lock().unwrap();
        serde_json::from_str(&calls.last().unwrap().1).unwrap()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn call(&self, system: &str, user: &str) -> LlmResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string())))
    }
}

/// Model double that answers by prompt, for concurrent turns
struct RoutedModel {
    plan: String,
    narration: String,
}

#[async_trait]
impl ModelClient for RoutedModel {
    async fn call(&self, system: &str, _user: &str) -> LlmResult<String> {
        if system == PLANNER_SYSTEM {
            Ok(self.plan.clone())
        } else {
            Ok(self.narration.clone())
        }
    }
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.data_dir = dir.path().to_string_lossy().into_owned();
    config.storage.settle_delay_ms = 0;
    config
}

fn plan(sql: &str, chart: Value) -> LlmResult<String> {
    Ok(json!({"needsClarification": false, "sql": sql, "chartSpec": chart}).to_string())
}

fn bar_chart() -> Value {
    json!({"type": "bar", "title": "Sales by region", "xKey": "region", "yKey": "total"})
}

async fn uploaded(pipeline: &Pipeline) -> String {
    pipeline.upload(SALES_CSV).await.unwrap().id.to_string()
}

fn answer(response: ChatResponse) -> tt_pipeline::ChatAnswer {
    match response {
        ChatResponse::Answer(answer) => answer,
        other => panic!("expected an answer, got {other:?}"),
    }
}

fn count_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map_or(0, |entries| entries.count())
}

// ---------------------------------------------------------------------------
// Upload, status, listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upload_then_status_round_trip() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(test_config(&dir), ScriptedModel::new(vec![]));

    let upload = pipeline.upload(SALES_CSV).await.unwrap();
    assert_eq!(upload.row_count, 8);
    let names: Vec<&str> = upload.schema.column_names().collect();
    assert_eq!(names, vec!["region", "product", "amount", "sold_on"]);

    let status = pipeline.status(upload.id.as_str()).unwrap();
    assert!(status.ready);
    assert_eq!(status.schema, upload.schema);
    assert_eq!(status.row_count, upload.row_count);

    let listing = pipeline.list();
    assert_eq!(listing.len(), 1);
    assert!(listing[0].ready);
    assert_eq!(listing[0].row_count, Some(8));

    let config = pipeline.config();
    assert!(config.uploads_dir().join(format!("{}.csv", upload.id)).exists());
    assert!(config.storage_dir().join(format!("{}.duckdb", upload.id)).exists());
}

#[tokio::test]
async fn test_upload_serializes_as_wire_format() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(test_config(&dir), ScriptedModel::new(vec![]));

    let upload = pipeline.upload(SALES_CSV).await.unwrap();
    let value = serde_json::to_value(&upload).unwrap();
    assert_eq!(value["rowCount"], 8);
    assert_eq!(value["schema"]["columns"][2], json!({"name": "amount", "type": "BIGINT"}));
}

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(test_config(&dir), ScriptedModel::new(vec![]));

    let err = pipeline.upload(b"").await.unwrap_err();
    assert!(matches!(err, PipelineError::InputInvalid(_)));
    assert!(pipeline.registry().is_empty());
}

#[tokio::test]
async fn test_failed_ingestion_cleans_up() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(test_config(&dir), ScriptedModel::new(vec![]));

    // Invalid UTF-8 makes the CSV reader fail.
    let err = pipeline.upload(b"name,value\n\xff\xfe,1\n").await.unwrap_err();
    assert_eq!(err.code(), "UPLOAD_FAILED");

    assert!(pipeline.registry().is_empty());
    let config = pipeline.config();
    assert_eq!(count_files(&config.uploads_dir()), 0);
    assert_eq!(count_files(&config.storage_dir()), 0);
}

/// Poll until `done` holds, giving background work up to five seconds
async fn eventually(mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if done() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    done()
}

#[tokio::test]
async fn test_abandoned_upload_still_finishes() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(test_config(&dir), ScriptedModel::new(vec![]));

    let _ = tokio::time::timeout(
        std::time::Duration::from_millis(1),
        pipeline.upload(SALES_CSV),
    )
    .await;

    assert!(eventually(|| pipeline.list().iter().all(|d| d.ready)).await);
    let listing = pipeline.list();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].row_count, Some(8));
}

#[tokio::test]
async fn test_abandoned_failed_upload_still_cleans_up() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(test_config(&dir), ScriptedModel::new(vec![]));

    let _ = tokio::time::timeout(
        std::time::Duration::from_millis(1),
        pipeline.upload(b"name,value\n\xff\xfe,1\n"),
    )
    .await;

    let config = pipeline.config().clone();
    assert!(
        eventually(|| {
            pipeline.registry().is_empty()
                && count_files(&config.uploads_dir()) == 0
                && count_files(&config.storage_dir()) == 0
        })
        .await
    );
}

#[tokio::test]
async fn test_status_lookup_failures() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(test_config(&dir), ScriptedModel::new(vec![]));

    let err = pipeline.status("no-such-id").unwrap_err();
    assert!(matches!(err, PipelineError::DatasetNotFound(_)));

    let err = pipeline.status("  ").unwrap_err();
    assert!(matches!(err, PipelineError::InputInvalid(_)));
}

// ---------------------------------------------------------------------------
// Chat turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_chat_answer() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        plan(BY_REGION_SQL, bar_chart()),
        Ok("North and south lead with 175 each.".to_string()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let response = pipeline
        .chat(&ChatRequest::new(&id, "Which region sells most?"))
        .await
        .unwrap();
    let answer = answer(response);

    assert_eq!(answer.answer_text, "North and south lead with 175 each.");
    assert_eq!(answer.sql, format!("{BY_REGION_SQL} LIMIT 500"));
    assert_eq!(answer.chart_spec.chart_type, ChartType::Bar);
    assert!(answer.warnings.is_empty());
    assert_eq!(answer.data.len(), 5);
    assert_eq!(answer.data[0]["region"], "north");
    assert_eq!(answer.data[0]["total"], 175);
    assert_eq!(model.systems(), vec![PLANNER_SYSTEM, EXPLAINER_SYSTEM]);

    let narration_input = model.last_user_payload();
    assert_eq!(narration_input["question"], "Which region sells most?");
    assert_eq!(narration_input["computedData"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_chat_zero_rows_skips_narration() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![plan(
        "SELECT region, amount FROM data WHERE amount > 100000",
        json!({"type": "table", "xKey": "region", "yKey": "amount"}),
    )]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let answer = answer(
        pipeline
            .chat(&ChatRequest::new(&id, "Huge orders?"))
            .await
            .unwrap(),
    );
    assert_eq!(answer.answer_text, NO_ROWS_ANSWER);
    assert!(answer.data.is_empty());
    assert_eq!(answer.warnings, vec![NO_ROWS_WARNING]);
    assert_eq!(model.systems(), vec![PLANNER_SYSTEM]);
}

#[tokio::test]
async fn test_chat_clarification() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![Ok(json!({
        "needsClarification": true,
        "clarificationQuestion": "Do you mean revenue or units?"
    })
    .to_string())]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let response = pipeline
        .chat(&ChatRequest::new(&id, "How are we doing?"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"clarificationQuestion": "Do you mean revenue or units?"})
    );
    assert_eq!(model.systems().len(), 1);
}

#[tokio::test]
async fn test_chat_plan_retried_once() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        Ok("Sorry, here is my plan: none".to_string()),
        plan(BY_REGION_SQL, bar_chart()),
        Ok("Done.".to_string()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let answer = answer(pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap());
    assert_eq!(answer.answer_text, "Done.");
    assert_eq!(
        model.systems(),
        vec![PLANNER_SYSTEM, PLANNER_SYSTEM, EXPLAINER_SYSTEM]
    );
}

#[tokio::test]
async fn test_chat_plan_unavailable_after_two_failures() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        Err(LlmError::Transport("connection reset".to_string())),
        Ok("still not json".to_string()),
        plan(BY_REGION_SQL, bar_chart()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let err = pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap_err();
    assert!(matches!(err, PipelineError::PlanUnavailable(_)));
    assert_eq!(model.systems().len(), 2);
}

#[tokio::test]
async fn test_chat_invalid_plan_not_retried() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        plan(
            BY_REGION_SQL,
            json!({"type": "pie", "xKey": "region", "yKey": "total", "maxCategories": 99}),
        ),
        plan(BY_REGION_SQL, bar_chart()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let err = pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidPlan(_)));
    assert_eq!(model.systems().len(), 1);
}

#[tokio::test]
async fn test_chat_guard_rejections() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        plan("SELECT * FROM data; DROP TABLE data", bar_chart()),
        plan("SELECT * FROM other", bar_chart()),
        plan("SELECT * FROM read_csv_auto('/etc/passwd')", bar_chart()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let err = pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap_err();
    assert_eq!(err.code(), "SQL_REJECTED");
    assert!(err.to_string().contains("Multiple statements"));

    let err = pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap_err();
    assert!(err.to_string().contains("\"other\""));

    let err = pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap_err();
    assert_eq!(err.code(), "SQL_REJECTED");

    // Nothing reached the engine, and no narration was requested.
    assert_eq!(pipeline.status(&id).unwrap().row_count, 8);
    assert!(!model.systems().iter().any(|s| s == EXPLAINER_SYSTEM));
}

#[tokio::test]
async fn test_chat_query_error() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![plan("SELECT no_such_column FROM data", bar_chart())]);
    let pipeline = Pipeline::new(test_config(&dir), model);
    let id = uploaded(&pipeline).await;

    let err = pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap_err();
    assert!(matches!(err, PipelineError::QueryError(_)));
}

#[tokio::test]
async fn test_chat_narration_falls_back() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        plan(BY_REGION_SQL, bar_chart()),
        Err(LlmError::Status {
            status: 503,
            body: "overloaded".to_string(),
        }),
        plan(BY_REGION_SQL, bar_chart()),
        Ok("   ".to_string()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model);
    let id = uploaded(&pipeline).await;

    for _ in 0..2 {
        let answer = answer(pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap());
        assert_eq!(answer.answer_text, FALLBACK_ANSWER);
        assert_eq!(answer.data.len(), 5);
    }
}

#[tokio::test]
async fn test_chat_pie_groups_remainder() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        plan(
            BY_REGION_SQL,
            json!({"type": "pie", "title": "Share", "xKey": "region", "yKey": "total",
                   "maxCategories": 3, "otherLabel": "Rest"}),
        ),
        Ok("Three regions dominate.".to_string()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let answer = answer(pipeline.chat(&ChatRequest::new(&id, "Share?")).await.unwrap());
    let regions: Vec<&str> = answer
        .data
        .iter()
        .map(|row| row["region"].as_str().unwrap())
        .collect();
    assert_eq!(regions, vec!["north", "south", "west", "Rest"]);
    assert_eq!(answer.data[3]["total"], 55);

    let sum: f64 = answer
        .data
        .iter()
        .map(|row| row["total"].as_f64().unwrap())
        .sum();
    assert_eq!(sum, 465.0);

    // The narration sees the shaped rows, not the raw result.
    let narration_input = model.last_user_payload();
    assert_eq!(narration_input["computedData"][3]["region"], "Rest");
}

#[tokio::test]
async fn test_chat_resolves_axis_case() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        plan(
            BY_REGION_SQL,
            json!({"type": "bar", "encoding": {"x": {"field": "REGION"}, "y": {"field": "Total"}}}),
        ),
        Ok("ok".to_string()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model);
    let id = uploaded(&pipeline).await;

    let answer = answer(pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap());
    assert_eq!(answer.chart_spec.x_key, "region");
    assert_eq!(answer.chart_spec.y_key, "total");
    assert_eq!(answer.chart_spec.title, "Chart");
}

#[tokio::test]
async fn test_chat_unknown_axis_is_invalid_plan() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![plan(
        BY_REGION_SQL,
        json!({"type": "bar", "xKey": "region", "yKey": "revenue"}),
    )]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let err = pipeline.chat(&ChatRequest::new(&id, "q")).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidPlan(_)));
    assert_eq!(model.systems(), vec![PLANNER_SYSTEM]);
}

#[tokio::test]
async fn test_chat_input_and_lookup_failures() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let err = pipeline.chat(&ChatRequest::new(&id, "   ")).await.unwrap_err();
    assert!(matches!(err, PipelineError::InputInvalid(_)));

    let err = pipeline.chat(&ChatRequest::new("", "q")).await.unwrap_err();
    assert!(matches!(err, PipelineError::InputInvalid(_)));

    let err = pipeline
        .chat(&ChatRequest::new("missing", "q"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::DatasetNotFound(_)));

    assert!(model.systems().is_empty());
}

#[tokio::test]
async fn test_concurrent_chats_on_one_dataset() {
    let dir = TempDir::new().unwrap();
    let model = Arc::new(RoutedModel {
        plan: plan(BY_REGION_SQL, bar_chart()).unwrap(),
        narration: "Summary.".to_string(),
    });
    let pipeline = Pipeline::new(test_config(&dir), model);
    let id = uploaded(&pipeline).await;

    let request = ChatRequest::new(&id, "Which region sells most?");
    let turns = (0..6).map(|_| pipeline.chat(&request));
    for response in join_all(turns).await {
        let answer = answer(response.unwrap());
        assert_eq!(answer.data.len(), 5);
        assert_eq!(answer.data[0]["total"], 175);
    }
}

// ---------------------------------------------------------------------------
// Suggested questions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_suggest_questions() {
    let dir = TempDir::new().unwrap();
    let model = ScriptedModel::new(vec![
        Ok(json!({"questions": ["Top region?", "Monthly trend?", "Best product?"]}).to_string()),
        Ok(json!({"questions": ["Only one?"]}).to_string()),
    ]);
    let pipeline = Pipeline::new(test_config(&dir), model.clone());
    let id = uploaded(&pipeline).await;

    let suggestions = pipeline.suggest_questions(&id).await.unwrap();
    assert_eq!(
        suggestions.questions,
        vec!["Top region?", "Monthly trend?", "Best product?"]
    );
    assert_eq!(model.systems(), vec![SUGGEST_QUESTIONS_SYSTEM]);

    let payload = model.last_user_payload();
    assert_eq!(payload["profile"]["rowCount"], 8);

    let err = pipeline.suggest_questions(&id).await.unwrap_err();
    assert!(matches!(err, PipelineError::SuggestionsUnavailable(_)));

    let err = pipeline.suggest_questions("missing").await.unwrap_err();
    assert!(matches!(err, PipelineError::DatasetNotFound(_)));
}
