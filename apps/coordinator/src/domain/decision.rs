//! Player decisions submitted during a turn.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cards_types::{Card, Color};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    PullFromDeck,
    PullFromPile,
    PlayHandCard,
    WildColorChoice,
    Challenge,
    NoChallenge,
    Pass,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One decision. `card` is set for PlayHandCard, `color` for WildColorChoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDecision {
    pub kind: DecisionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl PlayerDecision {
    fn bare(kind: DecisionKind) -> Self {
        Self {
            kind,
            card: None,
            color: None,
        }
    }

    pub fn pull_from_deck() -> Self {
        Self::bare(DecisionKind::PullFromDeck)
    }

    pub fn pull_from_pile() -> Self {
        Self::bare(DecisionKind::PullFromPile)
    }

    pub fn play(card: Card) -> Self {
        Self {
            card: Some(card),
            ..Self::bare(DecisionKind::PlayHandCard)
        }
    }

    pub fn choose_color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::bare(DecisionKind::WildColorChoice)
        }
    }

    pub fn challenge() -> Self {
        Self::bare(DecisionKind::Challenge)
    }

    pub fn no_challenge() -> Self {
        Self::bare(DecisionKind::NoChallenge)
    }

    pub fn pass() -> Self {
        Self::bare(DecisionKind::Pass)
    }
}
