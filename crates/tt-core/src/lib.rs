//! tt-core - Core library for TableTalk
//!
//! This crate provides the shared types used across all TableTalk
//! components: configuration parsing, dataset identity and schema,
//! the in-memory dataset registry, plan and chart types, and the
//! chart shaping transform applied to query results.

pub mod chart;
pub mod config;
pub mod dataset;
pub mod dataset_id;
pub mod error;
pub mod plan;
pub mod registry;
pub mod shape;

pub use chart::{ChartSpec, ChartType, TimeBucket};
pub use config::Config;
pub use dataset::{Dataset, DatasetProfile, DatasetSchema, SchemaColumn, DATA_TABLE};
pub use dataset_id::DatasetId;
pub use error::{CoreError, CoreResult};
pub use plan::Plan;
pub use registry::{DatasetRegistry, DatasetSummary, ReadyDataset};
pub use shape::{shape_rows, Row, ShapeLimits};
