//! Dataset record and schema types

use crate::dataset_id::DatasetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the single table every dataset's CSV is ingested into
pub const DATA_TABLE: &str = "data";

/// A single column as reported by the storage engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    /// Column name from the CSV header
    pub name: String,

    /// Engine-reported type string (e.g. `BIGINT`, `VARCHAR`)
    #[serde(rename = "type")]
    pub data_type: String,
}

impl SchemaColumn {
    /// Create a column entry
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered column list of a dataset's `data` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub columns: Vec<SchemaColumn>,
}

impl DatasetSchema {
    /// Create a schema from an ordered column list
    pub fn new(columns: Vec<SchemaColumn>) -> Self {
        Self { columns }
    }

    /// Column names in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Schema and row count captured once ingestion succeeds.
///
/// Stored as a single value so a dataset can never hold one without the
/// other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetProfile {
    pub schema: DatasetSchema,
    pub row_count: u64,
}

/// Registry record for an uploaded dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,

    /// Uploaded CSV file
    pub source_path: PathBuf,

    /// Per-dataset DuckDB file
    pub storage_path: PathBuf,

    pub created_at: DateTime<Utc>,

    /// Present exactly when the dataset is ready
    pub profile: Option<DatasetProfile>,
}

impl Dataset {
    /// Create a not-ready dataset record
    pub fn new(id: DatasetId, source_path: PathBuf, storage_path: PathBuf) -> Self {
        Self {
            id,
            source_path,
            storage_path,
            created_at: Utc::now(),
            profile: None,
        }
    }

    /// Whether ingestion and profiling have completed
    pub fn is_ready(&self) -> bool {
        self.profile.is_some()
    }

    pub fn schema(&self) -> Option<&DatasetSchema> {
        self.profile.as_ref().map(|p| &p.schema)
    }

    pub fn row_count(&self) -> Option<u64> {
        self.profile.as_ref().map(|p| p.row_count)
    }
}
