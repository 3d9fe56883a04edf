//! Repairs for near-JSON model output
//!
//! Models often return JSON wrapped in a markdown fence, JSON encoded a
//! second time as a string, or an object body without its braces. Each
//! repair is a pure function that either rewrites the text or declines;
//! they run in a fixed order before parsing.

use crate::error::{LlmError, LlmResult};
use serde_json::Value;

/// A single text repair; `None` leaves the text unchanged
pub type Repair = fn(&str) -> Option<String>;

/// Repairs in application order
pub const REPAIRS: &[(&str, Repair)] = &[
    ("strip_code_fence", strip_code_fence),
    ("unwrap_string_encoding", unwrap_string_encoding),
    ("wrap_bare_object", wrap_bare_object),
];

const FENCE: &str = "```";
const CLARIFICATION_KEY: &str = "needsClarification";

/// Extract the body of the first fenced code block.
///
/// The info string after the opening fence (`json`, `JSON`, ...) is
/// dropped, whether or not the body starts on the next line. An
/// unterminated fence keeps everything after the opening.
pub fn strip_code_fence(text: &str) -> Option<String> {
    let start = text.find(FENCE)?;
    let after_open = &text[start + FENCE.len()..];
    let body = match after_open.find('\n') {
        Some(i) if after_open[..i].trim().chars().all(is_info_char) => &after_open[i + 1..],
        _ => after_open.trim_start_matches(is_info_char),
    };
    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };
    Some(body.trim().to_string())
}

fn is_info_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Decode one layer of JSON string encoding, as in `"{\"sql\": ...}"`.
pub fn unwrap_string_encoding(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return None;
    }
    serde_json::from_str::<String>(trimmed)
        .ok()
        .map(|inner| inner.trim().to_string())
}

/// Add the braces around an object body that starts with the
/// `needsClarification` key.
pub fn wrap_bare_object(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_end_matches(',');
    let rest = trimmed
        .strip_prefix('"')
        .unwrap_or(trimmed)
        .strip_prefix(CLARIFICATION_KEY)?;
    let rest = rest.strip_prefix('"').unwrap_or(rest);
    // A dangling closing brace belongs to the missing opening one.
    let opens = rest.matches('{').count();
    let closes = rest.matches('}').count();
    let rest = if closes > opens {
        rest.strip_suffix('}').unwrap_or(rest)
    } else {
        rest
    };
    Some(format!("{{\"{}\"{}}}", CLARIFICATION_KEY, rest))
}

/// Apply every repair in order and return the resulting text
pub fn repair(text: &str) -> String {
    let mut current = text.trim().to_string();
    for (name, apply) in REPAIRS {
        if let Some(next) = apply(&current) {
            log::debug!("Applied repair {name}");
            current = next;
        }
    }
    current
}

/// Repair model text and parse it as JSON
pub fn parse_model_json(text: &str) -> LlmResult<Value> {
    let repaired = repair(text);
    serde_json::from_str(&repaired).map_err(|e| LlmError::MalformedJson(e.to_string()))
}

#[cfg(test)]
#[path = "repair_test.rs"]
mod tests;
