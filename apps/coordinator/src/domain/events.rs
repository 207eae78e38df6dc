//! Notifications emitted while the table is mutated.
//!
//! Events describe what a decision did; they are informational only.
//! Replicas never apply events, they replay the decisions themselves.

use serde::{Deserialize, Serialize};

use super::cards_types::{Card, Color};
use super::turn::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardLocation {
    DrawPile,
    DiscardPile,
    Hand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTransfer {
    pub source: CardLocation,
    pub sink: CardLocation,
    /// Owner of the hand on either side of the transfer.
    pub player: String,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    CardTransfer(CardTransfer),
    StarterFlipped {
        card: Card,
        required_color: Color,
    },
    DirectionChanged {
        direction: Direction,
    },
    TurnSkipped {
        player: String,
    },
    ColorChosen {
        player: String,
        color: Color,
    },
    ChallengeResolved {
        challenger: String,
        offender: String,
        upheld: bool,
        penalized: String,
    },
    PlayerWon {
        player: String,
    },
}
