//! CSV upload and ingestion

use crate::error::{PipelineError, PipelineResult};
use crate::service::Pipeline;
use crate::wire::UploadResponse;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tt_core::{Dataset, DatasetId, DatasetProfile, DatasetRegistry};
use tt_db::{ingest_csv, profile_dataset, StorageGateway};

impl Pipeline {
    /// Store `contents` as a new dataset and ingest it.
    ///
    /// On any failure the registry entry and every file written for the
    /// upload are removed before the error is returned. Ingestion and
    /// cleanup run in their own task, so a caller that stops waiting never
    /// leaves a half-written dataset behind.
    pub async fn upload(&self, contents: &[u8]) -> PipelineResult<UploadResponse> {
        if contents.is_empty() {
            return Err(PipelineError::InputInvalid("No CSV file provided".to_string()));
        }

        let id = DatasetId::generate();
        let job = UploadJob {
            registry: Arc::clone(&self.registry),
            gateway: self.gateway.clone(),
            uploads_dir: self.config.uploads_dir(),
            storage_dir: self.config.storage_dir(),
            source_path: self.config.uploads_dir().join(format!("{id}.csv")),
            storage_path: self.config.storage_dir().join(format!("{id}.duckdb")),
            id,
        };
        let dataset = Dataset::new(
            job.id.clone(),
            job.source_path.clone(),
            job.storage_path.clone(),
        );
        self.registry.create(dataset)?;

        let contents = contents.to_vec();
        tokio::spawn(job.run(contents))
            .await
            .map_err(|e| PipelineError::UploadFailed(format!("upload task failed: {e}")))?
    }
}

/// Everything one upload needs, owned so it can outlive the caller
struct UploadJob {
    registry: Arc<DatasetRegistry>,
    gateway: StorageGateway,
    uploads_dir: PathBuf,
    storage_dir: PathBuf,
    source_path: PathBuf,
    storage_path: PathBuf,
    id: DatasetId,
}

impl UploadJob {
    async fn run(self, contents: Vec<u8>) -> PipelineResult<UploadResponse> {
        match self.ingest(&contents).await {
            Ok(profile) => {
                self.registry.mark_ready(&self.id, profile.clone())?;
                log::info!("Dataset {} ready with {} rows", self.id, profile.row_count);
                Ok(UploadResponse {
                    id: self.id,
                    schema: profile.schema,
                    row_count: profile.row_count,
                })
            }
            Err(err) => {
                log::warn!("Upload {} failed: {}", self.id, err);
                self.registry.discard(&self.id);
                let artifacts = [
                    self.source_path.clone(),
                    wal_path(&self.storage_path),
                    self.storage_path.clone(),
                ];
                self.gateway
                    .lock()
                    .with_lock(&self.storage_path, || remove_artifacts(&artifacts))
                    .await;
                Err(err)
            }
        }
    }

    async fn ingest(&self, contents: &[u8]) -> PipelineResult<DatasetProfile> {
        for dir in [&self.uploads_dir, &self.storage_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| upload_failed(dir, e))?;
        }
        tokio::fs::write(&self.source_path, contents)
            .await
            .map_err(|e| upload_failed(&self.source_path, e))?;

        let csv = self.source_path.clone();
        self.gateway
            .session(&self.storage_path, move |db| {
                ingest_csv(db, &csv)?;
                profile_dataset(db)
            })
            .await
            .map_err(|e| PipelineError::UploadFailed(e.to_string()))
    }
}

fn upload_failed(path: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::UploadFailed(format!("{}: {}", path.display(), err))
}

fn wal_path(storage_path: &Path) -> PathBuf {
    let mut wal = storage_path.as_os_str().to_owned();
    wal.push(".wal");
    PathBuf::from(wal)
}

async fn remove_artifacts(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => log::debug!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wal_path() {
        assert_eq!(
            wal_path(Path::new("/data/duckdb/abc.duckdb")),
            PathBuf::from("/data/duckdb/abc.duckdb.wal")
        );
    }
}
