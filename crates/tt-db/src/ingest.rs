//! CSV ingestion and dataset profiling
//!
//! These functions take an open [`StorageHandle`] so that ingestion and
//! profiling of one upload run inside a single locked session.

use crate::error::{DbError, DbResult};
use crate::gateway::StorageHandle;
use std::path::Path;
use tt_core::{DatasetProfile, DatasetSchema, SchemaColumn, DATA_TABLE};

/// Escape a filesystem path for use inside a single-quoted SQL literal
fn sql_path_literal(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace('\'', "''")
}

/// Create the `data` table from the CSV at `csv_path`, with headers taken
/// from the first line and column types inferred by the engine.
pub fn ingest_csv(db: &StorageHandle, csv_path: &Path) -> DbResult<()> {
    let sql = format!(
        "CREATE TABLE {} AS SELECT * FROM read_csv_auto('{}', header = true)",
        DATA_TABLE,
        sql_path_literal(csv_path)
    );
    log::debug!("Ingesting {} into {}", csv_path.display(), db.path().display());
    db.run(&sql)
        .map_err(|e| DbError::CsvError(format!("{}: {}", csv_path.display(), e)))
}

/// Columns of the `data` table in table order
pub fn table_schema(db: &StorageHandle) -> DbResult<DatasetSchema> {
    let sql = format!(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_name = '{}' ORDER BY ordinal_position",
        DATA_TABLE
    );
    let columns = db
        .query(&sql)?
        .into_iter()
        .map(|row| {
            let field = |key: &str| {
                row.get(key)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| DbError::Internal(format!("schema row missing {key}")))
            };
            Ok(SchemaColumn::new(field("column_name")?, field("data_type")?))
        })
        .collect::<DbResult<Vec<_>>>()?;

    if columns.is_empty() {
        return Err(DbError::TableNotFound(DATA_TABLE.to_string()));
    }
    Ok(DatasetSchema::new(columns))
}

/// Number of rows in the `data` table
pub fn row_count(db: &StorageHandle) -> DbResult<u64> {
    let count = db.query_i64(&format!("SELECT COUNT(*) FROM {}", DATA_TABLE))?;
    u64::try_from(count).map_err(|_| DbError::Internal(format!("negative row count {count}")))
}

/// Schema and row count of the `data` table
pub fn profile_dataset(db: &StorageHandle) -> DbResult<DatasetProfile> {
    Ok(DatasetProfile {
        schema: table_schema(db)?,
        row_count: row_count(db)?,
    })
}
