//! Decision-maker trait used by in-process replicas.

use std::fmt;

use crate::domain::{PlayerDecision, Table};

/// Errors that can occur while choosing a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    /// Asked to decide while it is not this player's decision.
    NotMyDecision(String),
    /// The maker produced a decision the table rejected.
    InvalidMove(String),
    /// The turn did not finish within the decision budget.
    Runaway(usize),
}

impl fmt::Display for DecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionError::NotMyDecision(player) => write!(f, "{player} has nothing to decide"),
            DecisionError::InvalidMove(msg) => write!(f, "Invalid move: {msg}"),
            DecisionError::Runaway(n) => write!(f, "Turn unfinished after {n} decisions"),
        }
    }
}

impl std::error::Error for DecisionError {}

/// Chooses one decision at a time for the player `me`.
///
/// Implementations must only return kinds listed by
/// `table.eligible_decisions(me)`.
pub trait DecisionMaker: Send + Sync {
    fn name(&self) -> &'static str;

    fn decide(&self, table: &Table, me: &str) -> Result<PlayerDecision, DecisionError>;
}
