//! Core card-related types: Card, Rank, Color

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    /// Printed color of Wild and WildDrawFour cards. Never a legal required color.
    Wild,
}

impl Color {
    /// Colors a player may choose after playing a wild card.
    pub const PLAYABLE: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    pub fn is_wild(self) -> bool {
        self == Color::Wild
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Rank {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl Rank {
    pub const DIGITS: [Rank; 10] = [
        Rank::Zero,
        Rank::One,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
    ];

    pub const ACTIONS: [Rank; 3] = [Rank::Skip, Rank::Reverse, Rank::DrawTwo];

    /// Rank for a printed digit 0..=9.
    pub fn digit(n: u8) -> Option<Rank> {
        Self::DIGITS.get(n as usize).copied()
    }

    pub fn is_wild(self) -> bool {
        matches!(self, Rank::Wild | Rank::WildDrawFour)
    }

    pub fn is_action(self) -> bool {
        matches!(self, Rank::Skip | Rank::Reverse | Rank::DrawTwo)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub color: Color,
}

impl Card {
    pub const fn new(rank: Rank, color: Color) -> Self {
        Self { rank, color }
    }

    pub const fn wild() -> Self {
        Self::new(Rank::Wild, Color::Wild)
    }

    pub const fn wild_draw_four() -> Self {
        Self::new(Rank::WildDrawFour, Color::Wild)
    }

    pub fn is_wild(&self) -> bool {
        self.rank.is_wild()
    }
}

// Note: Ord on Card is only for stable sorting (color, then rank).
// Legality never compares cards by order.
impl Ord for Card {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.color.cmp(&other.color) {
            std::cmp::Ordering::Equal => self.rank.cmp(&other.rank),
            ord => ord,
        }
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::Yellow => "Yellow",
            Color::Wild => "Wild",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Skip => f.write_str("Skip"),
            Rank::Reverse => f.write_str("Reverse"),
            Rank::DrawTwo => f.write_str("Draw Two"),
            Rank::Wild => f.write_str("Wild"),
            Rank::WildDrawFour => f.write_str("Wild Draw Four"),
            digit => write!(f, "{}", *digit as u8),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wild() {
            write!(f, "{}", self.rank)
        } else {
            write!(f, "{} {}", self.color, self.rank)
        }
    }
}
