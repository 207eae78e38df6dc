//! Domain layer: cards, the table and its rules. Pure and synchronous.

pub mod cards_codec;
pub mod cards_logic;
pub mod cards_types;
pub mod decision;
pub mod deck;
pub mod events;
pub mod snapshot;
pub mod table;
pub mod turn;

#[cfg(test)]
mod test_gens;
#[cfg(test)]
mod test_prelude;
#[cfg(test)]
mod tests_table;

// Re-exports for ergonomics
pub use cards_codec::{decode_card, encode_card};
pub use cards_logic::{dominant_color, is_playable};
pub use cards_types::{Card, Color, Rank};
pub use decision::{DecisionKind, PlayerDecision};
pub use deck::{table_rng, Deck, DECK_SIZE};
pub use events::{CardLocation, CardTransfer, TableEvent};
pub use snapshot::{PublicView, TableSnapshot};
pub use table::{
    DecisionOutcome, PendingEffect, Table, MAX_HAND_SIZE, MIN_HAND_SIZE, MIN_PLAYERS,
    WILD_STARTER_COLOR,
};
pub use turn::{Direction, Seat, TurnPhase};
