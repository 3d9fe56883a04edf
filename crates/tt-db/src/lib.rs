//! tt-db - Storage layer for TableTalk
//!
//! This crate owns every access to a dataset's DuckDB file: the per-path
//! [`ResourceLock`] that serializes those accesses, the [`StorageGateway`]
//! that opens, uses, and closes a file as one locked unit, CSV ingestion
//! and profiling, and the [`QueryExecutor`] that bounds query time and
//! result size.

pub mod error;
pub mod executor;
pub mod gateway;
pub mod ingest;
pub mod lock;
pub mod value;

pub use error::{DbError, DbResult};
pub use executor::{QueryExecutor, QueryOptions};
pub use gateway::{StorageGateway, StorageHandle};
pub use ingest::{ingest_csv, profile_dataset, row_count, table_schema};
pub use lock::ResourceLock;
