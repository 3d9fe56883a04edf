//! tt-llm - Language model seam for TableTalk
//!
//! The [`ModelClient`] trait is the only way the rest of the system talks
//! to a model. Everything a model returns is untrusted text: it passes
//! through the [`repair`] chain, is decoded structurally, and is then
//! normalized into a [`tt_core::Plan`] or a fixed set of suggested
//! questions before any other component sees it.

pub mod client;
pub mod error;
pub mod plan;
pub mod prompts;
pub mod repair;
pub mod suggest;

pub use client::{ModelClient, OpenRouterClient};
pub use error::{LlmError, LlmResult};
pub use plan::{decode_plan, normalize, parse_plan, RawPlan};
pub use repair::parse_model_json;
pub use suggest::{parse_suggestions, SUGGESTION_COUNT};
