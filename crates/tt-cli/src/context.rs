//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tt_core::Config;
use tt_llm::OpenRouterClient;
use tt_pipeline::Pipeline;

use crate::cli::GlobalArgs;

/// Configuration resolved from the config file and global flags
pub(crate) struct RuntimeContext {
    pub config: Config,
}

impl RuntimeContext {
    /// Load configuration and apply global overrides
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                Config::load(Path::new(path)).context("Failed to load configuration file")?
            }
            None => Config::load_from_dir(Path::new("."))
                .context("Failed to load configuration from current directory")?,
        };
        if let Some(data_dir) = &args.data_dir {
            config.data_dir = data_dir.clone();
        }
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    /// Build a pipeline backed by the configured model endpoint
    pub fn pipeline(&self) -> Pipeline {
        let model = Arc::new(OpenRouterClient::from_config(&self.config.model));
        log::debug!("Using model {}", model.model());
        Pipeline::new(self.config.clone(), model)
    }
}
