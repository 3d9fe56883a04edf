//! Chat-turn state machine

use std::fmt;

/// Stage of a single chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    AwaitingPlan,
    PlanReceived,
    Clarifying,
    Validating,
    Executing,
    Shaping,
    Narrating,
    Done,
    /// Absorbing failure state carrying the reason code
    Failed(&'static str),
}

impl TurnState {
    /// Whether the turn has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Done | TurnState::Failed(_))
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn allows(&self, next: &TurnState) -> bool {
        use TurnState::*;
        match (self, next) {
            (Done, _) | (Failed(_), _) => false,
            (_, Failed(_)) => true,
            (AwaitingPlan, PlanReceived)
            | (PlanReceived, Clarifying)
            | (PlanReceived, Validating)
            | (Clarifying, Done)
            | (Validating, Executing)
            | (Executing, Shaping)
            | (Executing, Done)
            | (Shaping, Narrating)
            | (Narrating, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::Failed(code) => write!(f, "Failed({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Record of one turn's progress through [`TurnState`]
#[derive(Debug, Clone)]
pub struct Turn {
    history: Vec<TurnState>,
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

impl Turn {
    /// A turn waiting for its plan
    pub fn new() -> Self {
        Self {
            history: vec![TurnState::AwaitingPlan],
        }
    }

    /// Current state
    pub fn state(&self) -> &TurnState {
        // history always holds the initial state
        &self.history[self.history.len() - 1]
    }

    /// Every state visited, in order
    pub fn history(&self) -> &[TurnState] {
        &self.history
    }

    /// Move to `next`; illegal transitions are logged and ignored
    pub fn advance(&mut self, next: TurnState) {
        if !self.state().allows(&next) {
            log::warn!("Ignoring turn transition {} -> {}", self.state(), next);
            return;
        }
        log::debug!("Turn {} -> {}", self.state(), next);
        self.history.push(next);
    }

    /// Move to the absorbing failure state
    pub fn fail(&mut self, code: &'static str) {
        self.advance(TurnState::Failed(code));
    }
}
