//! System prompts and user payloads

use serde_json::json;
use tt_core::{ChartSpec, DatasetProfile, Row};

/// Planner instructions: produce a clarification or SQL plus chart
pub const PLANNER_SYSTEM: &str = r#"You are a senior data analyst.

You must output STRICT JSON only.

Rules:
- You MUST return valid JSON.
- No markdown.
- No explanation.
- Do not wrap in code blocks.

Your task:
Generate a SQL SELECT query and a chart specification.

Constraints:
- Table name is: data
- Only use provided columns.
- SQL must be SELECT-only.
- Never use INSERT, UPDATE, DELETE, DROP, CREATE, COPY, PRAGMA, ATTACH, or filesystem functions.
- Add ORDER BY and LIMIT for categorical charts.
- Prefer aggregated results.
- Column aliases in the SQL must match xKey and yKey.
- If the question is ambiguous, ask for clarification instead of guessing.

Chart rules:
- pie: aggregated categorical distribution
- bar: grouped categorical comparison
- line: time-based trend
- histogram: numeric distribution
- table: anything else

Return one of:
1) Clarification:
{
  "needsClarification": true,
  "clarificationQuestion": "..."
}

2) Plan:
{
  "needsClarification": false,
  "sql": "...",
  "chartSpec": {
    "type": "bar | line | pie | histogram | table",
    "title": "...",
    "xKey": "...",
    "yKey": "...",
    "maxCategories": 10,
    "timeBucket": "hour | day | week | month"
  },
  "assumptions": ["..."]
}"#;

/// Narration instructions for shaped results
pub const EXPLAINER_SYSTEM: &str = "You are a data analyst writing a short explanation of computed results.

Rules:
- Do NOT invent numbers.
- Only use the provided computed data.
- Keep under 120 words.
- Be concise and clear.
- Do not repeat raw JSON.
- Do not mention SQL.";

/// Instructions for proposing starter questions about a dataset
pub const SUGGEST_QUESTIONS_SYSTEM: &str = r#"You are a data analyst helping a user explore a table named data.

You must output STRICT JSON only, with no markdown and no explanation.

Given the table's columns and row count, propose exactly 3 short, specific questions
a user could ask that are answerable with a single SELECT over this table and that
would produce a useful chart.

Return:
{
  "questions": ["...", "...", "..."]
}"#;

/// Planner user message
pub fn planner_payload(question: &str, profile: &DatasetProfile) -> String {
    json!({
        "question": question,
        "schema": profile.schema,
        "profile": { "rowCount": profile.row_count },
    })
    .to_string()
}

/// Explainer user message
pub fn explainer_payload(question: &str, chart: &ChartSpec, computed: &[Row]) -> String {
    json!({
        "question": question,
        "chartSpec": chart,
        "computedData": computed,
    })
    .to_string()
}

/// Suggester user message
pub fn suggest_payload(profile: &DatasetProfile) -> String {
    json!({
        "schema": profile.schema,
        "profile": { "rowCount": profile.row_count },
    })
    .to_string()
}
