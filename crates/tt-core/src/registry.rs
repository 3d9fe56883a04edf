//! In-memory dataset registry
//!
//! [`DatasetRegistry`] is the single writer of dataset state. It is created
//! once at process start and shared by `Arc`; every other component reads
//! datasets by id only.

use crate::dataset::{Dataset, DatasetProfile};
use crate::dataset_id::DatasetId;
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A dataset that has completed ingestion, with its profile unwrapped
#[derive(Debug, Clone)]
pub struct ReadyDataset {
    pub id: DatasetId,
    pub storage_path: PathBuf,
    pub profile: DatasetProfile,
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
}

/// Thread-safe keyed store of dataset records
///
/// Readiness is monotonic: a record moves from not-ready to ready exactly
/// once and never back, so concurrent readers can never observe a
/// half-profiled dataset.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    datasets: RwLock<HashMap<DatasetId, Dataset>>,
}

impl DatasetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<DatasetId, Dataset>> {
        // Every write below is a single insert/remove/assign, so a panic
        // elsewhere cannot leave a record half-updated.
        self.datasets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<DatasetId, Dataset>> {
        self.datasets.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new, not-ready dataset
    pub fn create(&self, dataset: Dataset) -> CoreResult<()> {
        let mut datasets = self.write();
        if datasets.contains_key(&dataset.id) {
            return Err(CoreError::DuplicateDataset {
                id: dataset.id.to_string(),
            });
        }
        log::debug!("Registered dataset {}", dataset.id);
        datasets.insert(dataset.id.clone(), dataset);
        Ok(())
    }

    /// Attach the schema and row count, making the dataset ready
    pub fn mark_ready(&self, id: &DatasetId, profile: DatasetProfile) -> CoreResult<()> {
        let mut datasets = self.write();
        let dataset = datasets
            .get_mut(id)
            .ok_or_else(|| CoreError::DatasetNotFound { id: id.to_string() })?;
        if dataset.is_ready() {
            return Err(CoreError::DatasetAlreadyReady { id: id.to_string() });
        }
        log::debug!(
            "Dataset {} ready: {} columns, {} rows",
            id,
            profile.schema.columns.len(),
            profile.row_count
        );
        dataset.profile = Some(profile);
        Ok(())
    }

    /// Look up a dataset record
    pub fn get(&self, id: &DatasetId) -> Option<Dataset> {
        self.read().get(id).cloned()
    }

    /// Look up a dataset that must be ready for querying
    pub fn require_ready(&self, id: &DatasetId) -> CoreResult<ReadyDataset> {
        let datasets = self.read();
        let dataset = datasets
            .get(id)
            .ok_or_else(|| CoreError::DatasetNotFound { id: id.to_string() })?;
        match &dataset.profile {
            Some(profile) => Ok(ReadyDataset {
                id: dataset.id.clone(),
                storage_path: dataset.storage_path.clone(),
                profile: profile.clone(),
            }),
            None => Err(CoreError::DatasetNotReady { id: id.to_string() }),
        }
    }

    /// Remove a dataset whose ingestion failed.
    ///
    /// Ready datasets are never removed; `None` is returned for them and for
    /// unknown ids.
    pub fn discard(&self, id: &DatasetId) -> Option<Dataset> {
        let mut datasets = self.write();
        match datasets.get(id) {
            Some(dataset) if !dataset.is_ready() => {
                log::debug!("Discarded dataset {}", id);
                datasets.remove(id)
            }
            _ => None,
        }
    }

    /// All registered datasets, oldest first
    pub fn list(&self) -> Vec<DatasetSummary> {
        let datasets = self.read();
        let mut entries: Vec<&Dataset> = datasets.values().collect();
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        entries
            .into_iter()
            .map(|d| DatasetSummary {
                id: d.id.clone(),
                ready: d.is_ready(),
                row_count: d.row_count(),
            })
            .collect()
    }

    /// Number of registered datasets
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
