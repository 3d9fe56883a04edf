//! Canonical chart description types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Title used when the model omits one or leaves it blank
pub const DEFAULT_TITLE: &str = "Chart";

/// Pie slice count when the chart does not specify one
pub const DEFAULT_MAX_CATEGORIES: u32 = 10;

/// Label for the synthetic pie remainder slice
pub const DEFAULT_OTHER_LABEL: &str = "Other";

/// Accepted range for `maxCategories`
pub const MAX_CATEGORIES_RANGE: RangeInclusive<u32> = 2..=50;

/// Chart kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Histogram,
    Table,
}

impl ChartType {
    /// Wire name of the chart type
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Histogram => "histogram",
            ChartType::Table => "table",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "pie" => Ok(ChartType::Pie),
            "histogram" => Ok(ChartType::Histogram),
            "table" => Ok(ChartType::Table),
            other => Err(format!("unknown chart type '{}'", other)),
        }
    }
}

/// Time-bucket granularity for temporal x axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
    Month,
}

impl FromStr for TimeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(TimeBucket::Hour),
            "day" => Ok(TimeBucket::Day),
            "week" => Ok(TimeBucket::Week),
            "month" => Ok(TimeBucket::Month),
            other => Err(format!("unknown time bucket '{}'", other)),
        }
    }
}

/// Canonical chart description returned to clients
///
/// Produced only by plan normalization; `x_key` and `y_key` are always
/// non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub x_key: String,
    pub y_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_categories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_bucket: Option<TimeBucket>,
}

impl ChartSpec {
    /// Create a chart description with only the required fields set
    pub fn new(
        chart_type: ChartType,
        title: impl Into<String>,
        x_key: impl Into<String>,
        y_key: impl Into<String>,
    ) -> Self {
        Self {
            chart_type,
            title: title.into(),
            x_key: x_key.into(),
            y_key: y_key.into(),
            series_name: None,
            max_categories: None,
            other_label: None,
            time_bucket: None,
        }
    }
}
