//! Card game logic: play legality against the discard top and required color

use super::cards_types::{Card, Color};

/// A card may be played when it matches the discard top's rank, matches the
/// required color, or is wild.
pub fn is_playable(card: Card, top: Card, required: Color) -> bool {
    card.is_wild() || card.rank == top.rank || card.color == required
}

pub fn playable_cards(hand: &[Card], top: Card, required: Color) -> Vec<Card> {
    let mut v: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|c| is_playable(*c, top, required))
        .collect();
    v.sort();
    v
}

/// Whether `hand` still holds a legally playable card once one copy of
/// `played` is set aside. Used to judge a WildDrawFour challenge.
pub fn has_playable_besides(hand: &[Card], played: Card, top: Card, required: Color) -> bool {
    let mut skipped = false;
    hand.iter().any(|&c| {
        if !skipped && c == played {
            skipped = true;
            return false;
        }
        is_playable(c, top, required)
    })
}

/// Most frequent printed color in a hand, ties broken by color order.
/// Falls back to Red for a hand of only wild cards.
pub fn dominant_color(hand: &[Card]) -> Color {
    let mut best = Color::Red;
    let mut best_count = 0usize;
    for color in Color::PLAYABLE {
        let count = hand.iter().filter(|c| c.color == color).count();
        if count > best_count {
            best = color;
            best_count = count;
        }
    }
    best
}
