//! Plan decoding and normalization
//!
//! Decoding checks only the outer shape of the model's JSON. Normalization
//! then validates the content and produces the canonical [`Plan`]; its
//! failures are [`LlmError::InvalidPlan`] and are never worth retrying.

use crate::error::{LlmError, LlmResult};
use crate::repair::parse_model_json;
use serde::Deserialize;
use serde_json::{Map, Value};
use tt_core::chart::{DEFAULT_TITLE, MAX_CATEGORIES_RANGE};
use tt_core::{ChartSpec, ChartType, Plan, TimeBucket};

/// Longest SQL text accepted from the model, in characters
pub const MAX_SQL_CHARS: usize = 2000;

/// The model's plan as decoded, before normalization
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlan {
    pub needs_clarification: bool,

    #[serde(default)]
    pub clarification_question: Option<String>,

    #[serde(default)]
    pub sql: Option<String>,

    /// Kept loose; the accepted axis encodings vary
    #[serde(default)]
    pub chart_spec: Option<Value>,

    #[serde(default)]
    pub assumptions: Vec<String>,
}

/// Repair and structurally decode model text
pub fn decode_plan(text: &str) -> LlmResult<RawPlan> {
    let value = parse_model_json(text)?;
    serde_json::from_value(value).map_err(|e| LlmError::UnexpectedShape(e.to_string()))
}

/// Decode and normalize in one step
pub fn parse_plan(text: &str) -> LlmResult<Plan> {
    decode_plan(text).and_then(normalize)
}

fn invalid(message: impl Into<String>) -> LlmError {
    LlmError::InvalidPlan(message.into())
}

/// Validate a decoded plan and produce its canonical form
pub fn normalize(raw: RawPlan) -> LlmResult<Plan> {
    if raw.needs_clarification {
        let question = non_blank(raw.clarification_question.as_deref())
            .ok_or_else(|| invalid("clarification requested without a question"))?;
        return Ok(Plan::Clarification { question });
    }

    let sql = non_blank(raw.sql.as_deref()).ok_or_else(|| invalid("plan has no SQL"))?;
    let sql_chars = sql.chars().count();
    if sql_chars > MAX_SQL_CHARS {
        return Err(invalid(format!(
            "SQL is {} characters, limit is {}",
            sql_chars, MAX_SQL_CHARS
        )));
    }

    let chart = match raw.chart_spec {
        Some(Value::Object(obj)) => normalize_chart(&obj)?,
        Some(_) => return Err(invalid("chartSpec is not an object")),
        None => return Err(invalid("plan has no chartSpec")),
    };

    let assumptions = raw
        .assumptions
        .into_iter()
        .filter_map(|a| non_blank(Some(a.as_str())))
        .collect();

    Ok(Plan::Execution {
        sql,
        chart,
        assumptions,
    })
}

/// Extracts both axis fields from one encoding, or declines
pub type AxisStrategy = fn(&Map<String, Value>) -> Option<(String, String)>;

/// Accepted axis encodings; the first that yields both fields wins
pub const AXIS_STRATEGIES: &[(&str, AxisStrategy)] = &[
    ("xKey/yKey", direct_keys),
    ("xField/yField", direct_fields),
    ("encoding.x.field", encoding_fields),
    ("x.field", nested_fields),
];

fn direct_keys(obj: &Map<String, Value>) -> Option<(String, String)> {
    Some((text(obj.get("xKey"))?, text(obj.get("yKey"))?))
}

fn direct_fields(obj: &Map<String, Value>) -> Option<(String, String)> {
    Some((text(obj.get("xField"))?, text(obj.get("yField"))?))
}

fn encoding_fields(obj: &Map<String, Value>) -> Option<(String, String)> {
    let encoding = obj.get("encoding")?.as_object()?;
    nested_fields(encoding)
}

fn nested_fields(obj: &Map<String, Value>) -> Option<(String, String)> {
    let field = |axis: &str| text(obj.get(axis)?.get("field"));
    Some((field("x")?, field("y")?))
}

fn resolve_axes(obj: &Map<String, Value>) -> LlmResult<(String, String)> {
    AXIS_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            let axes = strategy(obj)?;
            log::debug!("Chart axes resolved via {name}");
            Some(axes)
        })
        .ok_or_else(|| invalid("chartSpec missing x or y field"))
}

fn normalize_chart(obj: &Map<String, Value>) -> LlmResult<ChartSpec> {
    let chart_type = match obj.get("type").and_then(Value::as_str) {
        Some(t) => t.parse::<ChartType>().map_err(invalid)?,
        None => return Err(invalid("chartSpec missing type")),
    };
    let title = text(obj.get("title")).unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let (x_key, y_key) = resolve_axes(obj)?;

    let max_categories = match obj.get("maxCategories") {
        None | Some(Value::Null) => None,
        Some(value) => Some(max_categories(value)?),
    };

    let time_bucket = match obj.get("timeBucket") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.parse::<TimeBucket>().map_err(invalid)?),
        Some(other) => return Err(invalid(format!("timeBucket must be a string, got {other}"))),
    };

    Ok(ChartSpec {
        chart_type,
        title,
        x_key,
        y_key,
        series_name: text(obj.get("seriesName")),
        max_categories,
        other_label: text(obj.get("otherLabel")),
        time_bucket,
    })
}

fn max_categories(value: &Value) -> LlmResult<u32> {
    let n = value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| MAX_CATEGORIES_RANGE.contains(n));
    n.ok_or_else(|| {
        invalid(format!(
            "maxCategories must be an integer between {} and {}, got {}",
            MAX_CATEGORIES_RANGE.start(),
            MAX_CATEGORIES_RANGE.end(),
            value
        ))
    })
}

fn text(value: Option<&Value>) -> Option<String> {
    non_blank(value?.as_str())
}

fn non_blank(s: Option<&str>) -> Option<String> {
    let trimmed = s?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
