//! Session state machine states.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    AddingPlayers,
    ReadyToServeCards,
    CardsServed,
    PlayerChosenForTurn,
    WaitingForPlayerDecision,
    WaitingForChallengeDecision,
    SyncingPlayerDecision,
    DoneSyncingPlayerDecision,
    HaveWinner,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddingPlayers => "AddingPlayers",
            Self::ReadyToServeCards => "ReadyToServeCards",
            Self::CardsServed => "CardsServed",
            Self::PlayerChosenForTurn => "PlayerChosenForTurn",
            Self::WaitingForPlayerDecision => "WaitingForPlayerDecision",
            Self::WaitingForChallengeDecision => "WaitingForChallengeDecision",
            Self::SyncingPlayerDecision => "SyncingPlayerDecision",
            Self::DoneSyncingPlayerDecision => "DoneSyncingPlayerDecision",
            Self::HaveWinner => "HaveWinner",
        }
    }

    /// States in which the chosen player's decisions are accepted.
    pub fn accepts_decisions(self) -> bool {
        matches!(
            self,
            Self::WaitingForPlayerDecision | Self::WaitingForChallengeDecision
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Self::HaveWinner
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
