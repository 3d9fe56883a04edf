//! tt-sql - SQL guard for TableTalk
//!
//! This crate statically checks model-generated SQL before it reaches the
//! database engine. The check is a lexical allow-list over the query text,
//! not a parser: it confines queries to read-only access of one named
//! table and nothing more.

pub mod guard;
pub mod limit;

pub use guard::{GuardRejection, GuardVerdict, SqlGuard};
pub use limit::{ensure_row_limit, has_limit_clause};
