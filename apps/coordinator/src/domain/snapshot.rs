//! Serializable snapshot of a table, for inspection and for seeding a
//! replica that joins a session from a known state.

use serde::{Deserialize, Serialize};

use crate::domain::cards_types::{Card, Color};
use crate::domain::deck::Deck;
use crate::domain::table::PendingEffect;
use crate::domain::turn::{Direction, Seat, TurnPhase};

/// Full table state, hands included.
///
/// Load with `Table::from_snapshot`, which re-validates card conservation
/// and seat references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub draw: Deck,
    pub discard: Deck,
    pub roster: Vec<String>,
    pub hands: Vec<Deck>,
    pub direction: Direction,
    pub required_color: Option<Color>,
    pub phase: TurnPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingEffect>,
    pub shuffler: Option<String>,
    pub current: Option<Seat>,
    pub next_turn: Seat,
    pub shuffled: bool,
    pub winner: Option<Seat>,
}

/// What everyone at the table can see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicView {
    pub players: Vec<String>,
    pub hand_sizes: Vec<usize>,
    pub draw_remaining: usize,
    pub discard_top: Option<Card>,
    pub required_color: Option<Color>,
    pub direction: Direction,
    pub current: Option<String>,
    pub next_turn: Option<String>,
    pub winner: Option<String>,
}

impl TableSnapshot {
    pub fn card_count(&self) -> usize {
        self.draw.len() + self.discard.len() + self.hands.iter().map(Deck::len).sum::<usize>()
    }

    pub fn public_view(&self) -> PublicView {
        let name = |seat: Seat| self.roster.get(seat).cloned();
        PublicView {
            players: self.roster.clone(),
            hand_sizes: self.hands.iter().map(Deck::len).collect(),
            draw_remaining: self.draw.len(),
            discard_top: self.discard.top(),
            required_color: self.required_color,
            direction: self.direction,
            current: self.current.and_then(name),
            next_turn: if self.roster.is_empty() {
                None
            } else {
                name(self.next_turn)
            },
            winner: self.winner.and_then(name),
        }
    }
}
