//! Read-only, single-table SQL guard
//!
//! Rules are checked in order and the first failure wins:
//!
//! 1. the trimmed text must start with `SELECT` (any case)
//! 2. nothing but whitespace may follow the first `;`
//! 3. no forbidden keyword or file-reading function may appear as a whole word
//! 4. every `FROM <ident>` and `JOIN <ident>` must name the allowed table
//!
//! Matching is purely textual. Keywords hidden behind comments, quoted
//! identifiers, or schema-qualified names are not detected, and a keyword
//! inside a string literal is still rejected.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tt_core::DATA_TABLE;

/// Statement keywords and file-reading functions that are never allowed
pub const FORBIDDEN_WORDS: &[&str] = &[
    "INSERT",
    "UPDATE",
    "DELETE",
    "DROP",
    "ALTER",
    "CREATE",
    "COPY",
    "ATTACH",
    "DETACH",
    "PRAGMA",
    "INSTALL",
    "LOAD",
    "read_csv",
    "read_csv_auto",
    "read_parquet",
    "glob",
];

fn forbidden_pattern() -> &'static Regex {
    static FORBIDDEN: OnceLock<Regex> = OnceLock::new();
    FORBIDDEN.get_or_init(|| {
        let alternation = FORBIDDEN_WORDS.join("|");
        Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("valid regex literal")
    })
}

fn table_ref_pattern() -> &'static Regex {
    static TABLE_REF: OnceLock<Regex> = OnceLock::new();
    TABLE_REF
        .get_or_init(|| Regex::new(r"(?i)\b(?:FROM|JOIN)\s+(\w+)").expect("valid regex literal"))
}

/// Why a query was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardRejection {
    #[error("Only SELECT queries are allowed")]
    NotSelect,

    #[error("Multiple statements not allowed")]
    MultipleStatements,

    #[error("Query contains forbidden keyword: {keyword}")]
    ForbiddenKeyword { keyword: String },

    #[error("Only table \"{allowed}\" is allowed (found \"{table}\")")]
    DisallowedTable { table: String, allowed: String },
}

/// Outcome of [`SqlGuard::evaluate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Allowed,
    Rejected(GuardRejection),
}

impl GuardVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardVerdict::Allowed)
    }

    /// Rejection reason, if any
    pub fn reason(&self) -> Option<&GuardRejection> {
        match self {
            GuardVerdict::Allowed => None,
            GuardVerdict::Rejected(reason) => Some(reason),
        }
    }

    /// Convert into a `Result`, for `?` at call sites
    pub fn into_result(self) -> Result<(), GuardRejection> {
        match self {
            GuardVerdict::Allowed => Ok(()),
            GuardVerdict::Rejected(reason) => Err(reason),
        }
    }
}

/// Lexical SQL validator bound to one allowed table name
#[derive(Debug, Clone)]
pub struct SqlGuard {
    allowed_table: String,
}

impl Default for SqlGuard {
    fn default() -> Self {
        Self::new(DATA_TABLE)
    }
}

impl SqlGuard {
    /// Create a guard that only admits references to `allowed_table`
    pub fn new(allowed_table: impl Into<String>) -> Self {
        Self {
            allowed_table: allowed_table.into(),
        }
    }

    /// The single table queries may reference
    pub fn allowed_table(&self) -> &str {
        &self.allowed_table
    }

    /// Check `sql` against the read-only, single-table policy
    pub fn evaluate(&self, sql: &str) -> GuardVerdict {
        let verdict = self.check(sql);
        if let GuardVerdict::Rejected(reason) = &verdict {
            log::debug!("SQL guard rejected query: {}", reason);
        }
        verdict
    }

    fn check(&self, sql: &str) -> GuardVerdict {
        let trimmed = sql.trim();

        if !starts_with_select(trimmed) {
            return GuardVerdict::Rejected(GuardRejection::NotSelect);
        }

        if let Some(pos) = trimmed.find(';') {
            if !trimmed[pos + 1..].trim().is_empty() {
                return GuardVerdict::Rejected(GuardRejection::MultipleStatements);
            }
        }

        if let Some(found) = forbidden_pattern().find(trimmed) {
            return GuardVerdict::Rejected(GuardRejection::ForbiddenKeyword {
                keyword: found.as_str().to_string(),
            });
        }

        for captures in table_ref_pattern().captures_iter(trimmed) {
            let table = &captures[1];
            if !table.eq_ignore_ascii_case(&self.allowed_table) {
                return GuardVerdict::Rejected(GuardRejection::DisallowedTable {
                    table: table.to_string(),
                    allowed: self.allowed_table.clone(),
                });
            }
        }

        GuardVerdict::Allowed
    }
}

fn starts_with_select(text: &str) -> bool {
    text.get(..6)
        .map(|head| head.eq_ignore_ascii_case("SELECT"))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
