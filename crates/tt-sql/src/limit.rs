//! Row-limit appending

use regex::Regex;
use std::sync::OnceLock;

fn limit_pattern() -> &'static Regex {
    static LIMIT: OnceLock<Regex> = OnceLock::new();
    LIMIT.get_or_init(|| Regex::new(r"(?i)\sLIMIT\s").expect("valid regex literal"))
}

/// Whether `sql` already contains a whitespace-delimited `LIMIT` keyword
pub fn has_limit_clause(sql: &str) -> bool {
    limit_pattern().is_match(sql)
}

/// Strip one trailing semicolon and append `LIMIT cap` unless the query
/// already has a LIMIT.
///
/// An existing LIMIT anywhere in the text is respected, including one that
/// belongs to a subquery.
pub fn ensure_row_limit(sql: &str, cap: usize) -> String {
    let trimmed = sql.trim();
    let statement = trimmed
        .strip_suffix(';')
        .map(str::trim_end)
        .unwrap_or(trimmed);

    if has_limit_clause(statement) {
        statement.to_string()
    } else {
        format!("{} LIMIT {}", statement, cap)
    }
}
