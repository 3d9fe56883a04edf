//! Configuration types and parsing for tabletalk.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main service configuration from tabletalk.yml
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root directory for uploaded CSV files and per-dataset DuckDB files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model transport settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Query execution bounds
    #[serde(default)]
    pub query: QueryConfig,

    /// Chart shaping bounds
    #[serde(default)]
    pub shaping: ShapingConfig,

    /// Storage access settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Language model transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Chat-completions endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Query execution bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Hard cap on rows returned by the executor
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Per-query timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// LIMIT appended to model-generated SQL on the chat path
    #[serde(default = "default_chat_row_limit")]
    pub chat_row_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            timeout_ms: default_timeout_ms(),
            chat_row_limit: default_chat_row_limit(),
        }
    }
}

impl QueryConfig {
    /// Query timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Chart shaping bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapingConfig {
    /// Maximum bars kept for bar charts
    #[serde(default = "default_max_bar")]
    pub max_bar: usize,

    /// Maximum points kept for line charts
    #[serde(default = "default_max_line_points")]
    pub max_line_points: usize,

    /// Pie slice count when the chart does not specify one
    #[serde(default = "default_max_categories")]
    pub default_max_categories: u32,

    /// Label of the synthetic pie remainder slice when the chart does not specify one
    #[serde(default = "default_other_label")]
    pub default_other_label: String,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            max_bar: default_max_bar(),
            max_line_points: default_max_line_points(),
            default_max_categories: default_max_categories(),
            default_other_label: default_other_label(),
        }
    }
}

/// Storage access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Delay after each storage operation before the next one on the same
    /// file may start. Zero disables it.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl StorageConfig {
    /// Settling delay as a [`Duration`]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

const DEFAULT_DATA_DIR: &str = ".data";

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_max_rows() -> usize {
    5000
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_chat_row_limit() -> usize {
    500
}

fn default_max_bar() -> usize {
    30
}

fn default_max_line_points() -> usize {
    2000
}

fn default_max_categories() -> u32 {
    crate::chart::DEFAULT_MAX_CATEGORIES
}

fn default_other_label() -> String {
    crate::chart::DEFAULT_OTHER_LABEL.to_string()
}

fn default_settle_delay_ms() -> u64 {
    250
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            query: QueryConfig::default(),
            shaping: ShapingConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn parse(content: &str) -> CoreResult<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, falling back to defaults when
    /// neither tabletalk.yml nor tabletalk.yaml exists
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("tabletalk.yml");
        let yaml_path = dir.join("tabletalk.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            log::debug!(
                "No tabletalk.yml in {}, using default configuration",
                dir.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate value ranges
    pub fn validate(&self) -> CoreResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(invalid("data_dir must not be empty"));
        }
        if self.query.max_rows == 0 {
            return Err(invalid("query.max_rows must be greater than 0"));
        }
        if self.query.chat_row_limit == 0 {
            return Err(invalid("query.chat_row_limit must be greater than 0"));
        }
        if self.query.timeout_ms == 0 {
            return Err(invalid("query.timeout_ms must be greater than 0"));
        }
        if self.shaping.max_bar == 0 || self.shaping.max_line_points == 0 {
            return Err(invalid("shaping bounds must be greater than 0"));
        }
        if !crate::chart::MAX_CATEGORIES_RANGE.contains(&self.shaping.default_max_categories) {
            return Err(invalid(&format!(
                "shaping.default_max_categories must be between {} and {}",
                crate::chart::MAX_CATEGORIES_RANGE.start(),
                crate::chart::MAX_CATEGORIES_RANGE.end()
            )));
        }
        if self.model.api_key_env.trim().is_empty() {
            return Err(invalid("model.api_key_env must not be empty"));
        }
        Ok(())
    }

    /// Directory holding uploaded CSV files
    pub fn uploads_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("uploads")
    }

    /// Directory holding per-dataset DuckDB files
    pub fn storage_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("duckdb")
    }
}

fn invalid(message: &str) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.to_string(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
