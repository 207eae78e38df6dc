//! Deterministic ack ids.
//!
//! Format: `{phase}:{source}>{target}#{counter}`. The acker is always the
//! target. Both sides build the id independently from data they already
//! hold, so no id is ever sent ahead of the push it confirms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the coordinator when it is the source of a push.
pub const COORDINATOR_IDENTITY: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckPhase {
    Join,
    ServedCards,
    ChosenPlayer,
    DecisionSync,
}

impl AckPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::ServedCards => "served-cards",
            Self::ChosenPlayer => "chosen-player",
            Self::DecisionSync => "decision-sync",
        }
    }
}

impl fmt::Display for AckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn ack_id(phase: AckPhase, source: &str, target: &str, counter: u64) -> String {
    format!("{phase}:{source}>{target}#{counter}")
}

/// One expected acknowledgment: `acker` confirms the delivery named by `ack_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ack {
    pub ack_id: String,
    pub acker: String,
}

impl Ack {
    pub fn new(ack_id: impl Into<String>, acker: impl Into<String>) -> Self {
        Self {
            ack_id: ack_id.into(),
            acker: acker.into(),
        }
    }

    pub fn for_delivery(phase: AckPhase, source: &str, target: &str, counter: u64) -> Self {
        Self::new(ack_id(phase, source, target, counter), target)
    }

    /// `target` learned that `announced` is at the table.
    pub fn join(announced: &str, target: &str) -> Self {
        Self::for_delivery(AckPhase::Join, announced, target, 0)
    }

    pub fn served_cards(target: &str) -> Self {
        Self::for_delivery(AckPhase::ServedCards, COORDINATOR_IDENTITY, target, 0)
    }

    pub fn chosen_player(target: &str, counter: u64) -> Self {
        Self::for_delivery(AckPhase::ChosenPlayer, COORDINATOR_IDENTITY, target, counter)
    }

    pub fn decision_sync(decider: &str, target: &str, counter: u64) -> Self {
        Self::for_delivery(AckPhase::DecisionSync, decider, target, counter)
    }

    pub fn is_phase(&self, phase: AckPhase) -> bool {
        self.ack_id
            .split_once(':')
            .is_some_and(|(prefix, _)| prefix == phase.as_str())
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (acker {})", self.ack_id, self.acker)
    }
}
