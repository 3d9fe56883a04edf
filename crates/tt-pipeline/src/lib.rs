//! tt-pipeline - Chat-turn orchestration for TableTalk
//!
//! [`Pipeline`] owns the dataset registry, the storage gateway, the query
//! executor, the SQL guard, and the model client, and exposes the
//! operations the HTTP surface and CLI call: upload, status, listing,
//! chat, and suggested questions.
//!
//! A chat turn moves through the states in [`state::TurnState`]:
//! plan, guard, execute, shape, narrate. Only the plan call is retried,
//! exactly once; narration failures degrade to a fixed text.

pub mod chat;
pub mod error;
pub mod service;
pub mod state;
pub mod suggest;
pub mod upload;
pub mod wire;

pub use error::{PipelineError, PipelineResult};
pub use service::Pipeline;
pub use state::{Turn, TurnState};
pub use wire::{ChatAnswer, ChatRequest, ChatResponse, DatasetStatus, Suggestions, UploadResponse};
