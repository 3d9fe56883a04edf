//! Chart shaping
//!
//! Bounds raw query rows to a size the chart surface can render, without a
//! second database round-trip. The bounds are rendering limits, not
//! correctness limits, and come from [`ShapingConfig`].

use crate::chart::{ChartSpec, ChartType};
use crate::config::ShapingConfig;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// One result row: column name to JSON value, in result-column order
pub type Row = Map<String, Value>;

/// Largest integer magnitude an f64 represents exactly (2^53)
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

/// Size bounds applied per chart type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeLimits {
    pub max_bar: usize,
    pub max_line_points: usize,
    pub default_max_categories: u32,
    pub default_other_label: String,
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self::from(&ShapingConfig::default())
    }
}

impl From<&ShapingConfig> for ShapeLimits {
    fn from(config: &ShapingConfig) -> Self {
        Self {
            max_bar: config.max_bar,
            max_line_points: config.max_line_points,
            default_max_categories: config.default_max_categories,
            default_other_label: config.default_other_label.clone(),
        }
    }
}

/// Shape `rows` for rendering as `chart`.
///
/// - `pie`: top N slices by y descending, the rest summed into one
///   remainder slice labelled with the chart's other-label
/// - `bar`: first `max_bar` rows, order preserved
/// - `line`: first `max_line_points` rows, order preserved
/// - `histogram`, `table`: unchanged
pub fn shape_rows(rows: Vec<Row>, chart: &ChartSpec, limits: &ShapeLimits) -> Vec<Row> {
    if rows.is_empty() {
        return rows;
    }

    match chart.chart_type {
        ChartType::Pie => shape_pie(rows, chart, limits),
        ChartType::Bar => truncate(rows, limits.max_bar),
        ChartType::Line => truncate(rows, limits.max_line_points),
        ChartType::Histogram | ChartType::Table => rows,
    }
}

fn truncate(mut rows: Vec<Row>, bound: usize) -> Vec<Row> {
    rows.truncate(bound);
    rows
}

fn shape_pie(rows: Vec<Row>, chart: &ChartSpec, limits: &ShapeLimits) -> Vec<Row> {
    let max_categories = chart
        .max_categories
        .unwrap_or(limits.default_max_categories) as usize;
    let keep = rows.len().min(max_categories);

    let mut keyed: Vec<(f64, Row)> = rows
        .into_iter()
        .map(|row| (numeric_value(row.get(&chart.y_key)), row))
        .collect();
    // Stable sort keeps query order among equal slices.
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let rest = keyed.split_off(keep);
    let mut shaped: Vec<Row> = keyed.into_iter().map(|(_, row)| row).collect();
    if rest.is_empty() {
        return shaped;
    }

    let remainder: f64 = rest.iter().map(|(value, _)| value).sum();
    let label = chart
        .other_label
        .clone()
        .unwrap_or_else(|| limits.default_other_label.clone());

    let mut other = Row::new();
    other.insert(chart.x_key.clone(), Value::String(label));
    other.insert(chart.y_key.clone(), number_value(remainder));
    shaped.push(other);
    shaped
}

/// Numeric reading of a cell; missing, null, and non-numeric values are 0
pub fn numeric_value(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// JSON number for `value`, written as an integer when it is one exactly
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER as f64 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

#[cfg(test)]
#[path = "shape_test.rs"]
mod tests;
