//! Conversion of DuckDB values into JSON-safe values
//!
//! Integers beyond the range an f64 represents exactly (2^53) are emitted
//! as floating numbers so every client decodes them the same way. Temporal
//! values become strings and decimals become numbers.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeDelta};
use duckdb::types::{TimeUnit, Value};
use serde_json::{Number, Value as JsonValue};
use tt_core::shape::MAX_SAFE_INTEGER;

/// Convert one DuckDB cell to JSON
pub fn to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(n) => JsonValue::from(n),
        Value::SmallInt(n) => JsonValue::from(n),
        Value::Int(n) => JsonValue::from(n),
        Value::BigInt(n) => safe_i128(i128::from(n)),
        Value::HugeInt(n) => safe_i128(n),
        Value::UTinyInt(n) => JsonValue::from(n),
        Value::USmallInt(n) => JsonValue::from(n),
        Value::UInt(n) => JsonValue::from(n),
        Value::UBigInt(n) => safe_i128(i128::from(n)),
        Value::Float(f) => float(f64::from(f)),
        Value::Double(f) => float(f),
        Value::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map_or(JsonValue::Null, float),
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s),
        Value::Blob(bytes) => JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Timestamp(unit, raw) => timestamp(unit, raw),
        Value::Date32(days) => date(days),
        Value::Time64(unit, raw) => time(unit, raw),
        Value::Interval {
            months,
            days,
            nanos,
        } => JsonValue::String(format!("{months} months {days} days {nanos} ns")),
        Value::List(items) | Value::Array(items) => {
            JsonValue::Array(items.into_iter().map(to_json).collect())
        }
        other => JsonValue::String(format!("{other:?}")),
    }
}

/// JSON number for an integer, falling back to f64 outside ±2^53
pub fn safe_i128(n: i128) -> JsonValue {
    if n.unsigned_abs() <= MAX_SAFE_INTEGER as u128 {
        JsonValue::Number(Number::from(n as i64))
    } else {
        float(n as f64)
    }
}

fn float(f: f64) -> JsonValue {
    Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
}

fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

fn timestamp(unit: TimeUnit, raw: i64) -> JsonValue {
    match DateTime::from_timestamp_micros(to_micros(unit, raw)) {
        Some(ts) => JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => JsonValue::Null,
    }
}

fn date(days: i32) -> JsonValue {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(TimeDelta::days(i64::from(days))))
        .map_or(JsonValue::Null, |d| {
            JsonValue::String(d.format("%Y-%m-%d").to_string())
        })
}

fn time(unit: TimeUnit, raw: i64) -> JsonValue {
    let micros = to_micros(unit, raw);
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1_000;
    match (u32::try_from(secs), u32::try_from(nanos)) {
        (Ok(secs), Ok(nanos)) => NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
            .map_or(JsonValue::Null, |t| JsonValue::String(t.to_string())),
        _ => JsonValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_safe_integers_stay_integers() {
        assert_eq!(to_json(Value::BigInt(42)), json!(42));
        assert_eq!(to_json(Value::BigInt(-MAX_SAFE_INTEGER)), json!(-MAX_SAFE_INTEGER));
        assert_eq!(to_json(Value::HugeInt(7)), json!(7));
        assert_eq!(to_json(Value::UBigInt(9)), json!(9));
    }

    #[test]
    fn test_unsafe_integers_become_floats() {
        let big = to_json(Value::BigInt(i64::MAX));
        assert!(big.is_f64());
        assert_eq!(big.as_f64().unwrap(), i64::MAX as f64);

        let huge = to_json(Value::HugeInt(i128::MAX));
        assert!(huge.is_f64());
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_json(Value::Null), JsonValue::Null);
        assert_eq!(to_json(Value::Boolean(true)), json!(true));
        assert_eq!(to_json(Value::Double(1.5)), json!(1.5));
        assert_eq!(to_json(Value::Double(f64::NAN)), JsonValue::Null);
        assert_eq!(to_json(Value::Text("x".to_string())), json!("x"));
    }

    #[test]
    fn test_temporal_values() {
        assert_eq!(to_json(Value::Date32(0)), json!("1970-01-01"));
        assert_eq!(to_json(Value::Date32(19723)), json!("2024-01-01"));
        assert_eq!(
            to_json(Value::Timestamp(TimeUnit::Second, 1_704_067_200)),
            json!("2024-01-01T00:00:00.000Z")
        );
        assert_eq!(
            to_json(Value::Time64(TimeUnit::Microsecond, 3_661_000_000)),
            json!("01:01:01")
        );
    }

    #[test]
    fn test_lists_convert_elementwise() {
        assert_eq!(
            to_json(Value::List(vec![Value::Int(1), Value::Null])),
            json!([1, null])
        );
    }
}
