//! Normalized model plan

use crate::chart::ChartSpec;

/// The model's decision for one chat turn, after normalization.
///
/// Exactly one variant exists per plan, so a clarification can never carry
/// SQL or chart fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// The question is ambiguous; ask the user this instead of answering
    Clarification { question: String },

    /// Run `sql` and render the result as `chart`
    Execution {
        sql: String,
        chart: ChartSpec,
        assumptions: Vec<String>,
    },
}

impl Plan {
    /// Whether this plan asks for clarification
    pub fn is_clarification(&self) -> bool {
        matches!(self, Plan::Clarification { .. })
    }
}
