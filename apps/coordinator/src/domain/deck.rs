//! Card stacks: draw pile, discard pile and hands, plus the shuffle.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::cards_types::{Card, Color, Rank};

/// Cards in a complete deck.
pub const DECK_SIZE: usize = 108;

/// Ordered cards used as a stack: push and pop at the tail, which is the top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    /// The 108-card deck in standard order.
    ///
    /// Per color: one 0, two each of 1..=9, Skip, Reverse and DrawTwo.
    /// Then four Wild and four WildDrawFour.
    pub fn full() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for color in Color::PLAYABLE {
            cards.push(Card::new(Rank::Zero, color));
            for rank in Rank::DIGITS.iter().skip(1).chain(Rank::ACTIONS.iter()) {
                cards.push(Card::new(*rank, color));
                cards.push(Card::new(*rank, color));
            }
        }
        for _ in 0..4 {
            cards.push(Card::wild());
            cards.push(Card::wild_draw_four());
        }
        Self { cards }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn pop(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    /// Remove one copy of `card`, keeping the order of the rest.
    pub fn remove_card(&mut self, card: Card) -> Option<Card> {
        let pos = self.cards.iter().position(|&c| c == card)?;
        Some(self.cards.remove(pos))
    }

    /// Unbiased Fisher-Yates shuffle.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.cards.len()).rev() {
            let j = rng.random_range(0..=i);
            self.cards.swap(i, j);
        }
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

/// RNG for the single shuffle of a session. A seed makes the deal
/// reproducible; without one the generator is seeded from the OS.
pub fn table_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}
