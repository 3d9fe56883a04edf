//! Pipeline construction and dataset lookups

use crate::error::{PipelineError, PipelineResult};
use crate::wire::DatasetStatus;
use std::sync::Arc;
use tt_core::{Config, DatasetId, DatasetRegistry, DatasetSummary, ReadyDataset, ShapeLimits};
use tt_db::{QueryExecutor, QueryOptions, StorageGateway};
use tt_llm::ModelClient;
use tt_sql::SqlGuard;

/// Shared service state for every dataset operation
///
/// Cheap to share behind an `Arc`; all interior state is itself
/// thread-safe.
pub struct Pipeline {
    pub(crate) config: Config,
    pub(crate) registry: Arc<DatasetRegistry>,
    pub(crate) gateway: StorageGateway,
    pub(crate) executor: QueryExecutor,
    pub(crate) guard: SqlGuard,
    pub(crate) model: Arc<dyn ModelClient>,
    pub(crate) limits: ShapeLimits,
}

impl Pipeline {
    /// Build a pipeline with an empty registry
    pub fn new(config: Config, model: Arc<dyn ModelClient>) -> Self {
        Self::with_registry(config, model, Arc::new(DatasetRegistry::new()))
    }

    /// Build a pipeline around an existing registry
    pub fn with_registry(
        config: Config,
        model: Arc<dyn ModelClient>,
        registry: Arc<DatasetRegistry>,
    ) -> Self {
        let gateway = StorageGateway::new(config.storage.settle_delay());
        let executor = QueryExecutor::new(gateway.clone(), QueryOptions::from(&config.query));
        let limits = ShapeLimits::from(&config.shaping);
        Self {
            config,
            registry,
            gateway,
            executor,
            guard: SqlGuard::default(),
            model,
            limits,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DatasetRegistry> {
        &self.registry
    }

    /// Parse a caller-supplied dataset id
    pub(crate) fn parse_id(raw: &str) -> PipelineResult<DatasetId> {
        DatasetId::try_new(raw)
            .ok_or_else(|| PipelineError::InputInvalid("dataset id required".to_string()))
    }

    /// Look up a dataset that must be ready
    pub(crate) fn ready_dataset(&self, raw_id: &str) -> PipelineResult<ReadyDataset> {
        let id = Self::parse_id(raw_id)?;
        Ok(self.registry.require_ready(&id)?)
    }

    /// Schema and row count of a ready dataset
    pub fn status(&self, raw_id: &str) -> PipelineResult<DatasetStatus> {
        let dataset = self.ready_dataset(raw_id)?;
        Ok(DatasetStatus {
            id: dataset.id,
            schema: dataset.profile.schema,
            row_count: dataset.profile.row_count,
            ready: true,
        })
    }

    /// Every registered dataset, oldest first
    pub fn list(&self) -> Vec<DatasetSummary> {
        self.registry.list()
    }
}
