//! Compact 9-bit card encoding used for fixtures and persistence.
//!
//! Layout: `rank << 4 | color`, 5 bits of rank over 4 bits of color.
//! Rank codes 0..=9 are the digits, then Skip=10, Reverse=11, DrawTwo=12,
//! Wild=13, WildDrawFour=14. Color codes are Red=0, Green=1, Blue=2,
//! Yellow=3, Wild=4.

use super::cards_types::{Card, Color, Rank};
use crate::errors::domain::{DomainError, ValidationKind};

pub const RANK_BITS: u16 = 5;
pub const COLOR_BITS: u16 = 4;
pub const CARD_CODE_LIMIT: u16 = 1 << (RANK_BITS + COLOR_BITS);

const COLOR_MASK: u16 = (1 << COLOR_BITS) - 1;

fn rank_code(rank: Rank) -> u16 {
    match rank {
        Rank::Zero => 0,
        Rank::One => 1,
        Rank::Two => 2,
        Rank::Three => 3,
        Rank::Four => 4,
        Rank::Five => 5,
        Rank::Six => 6,
        Rank::Seven => 7,
        Rank::Eight => 8,
        Rank::Nine => 9,
        Rank::Skip => 10,
        Rank::Reverse => 11,
        Rank::DrawTwo => 12,
        Rank::Wild => 13,
        Rank::WildDrawFour => 14,
    }
}

fn rank_from_code(code: u16) -> Option<Rank> {
    match code {
        0..=9 => Rank::digit(code as u8),
        10 => Some(Rank::Skip),
        11 => Some(Rank::Reverse),
        12 => Some(Rank::DrawTwo),
        13 => Some(Rank::Wild),
        14 => Some(Rank::WildDrawFour),
        _ => None,
    }
}

fn color_code(color: Color) -> u16 {
    match color {
        Color::Red => 0,
        Color::Green => 1,
        Color::Blue => 2,
        Color::Yellow => 3,
        Color::Wild => 4,
    }
}

fn color_from_code(code: u16) -> Option<Color> {
    match code {
        0 => Some(Color::Red),
        1 => Some(Color::Green),
        2 => Some(Color::Blue),
        3 => Some(Color::Yellow),
        4 => Some(Color::Wild),
        _ => None,
    }
}

pub fn encode_card(card: Card) -> u16 {
    (rank_code(card.rank) << COLOR_BITS) | color_code(card.color)
}

/// Decode a 9-bit card code.
///
/// Rejects codes at or above 512, rank codes above 14, color codes above 4,
/// and cards whose wildness disagrees between rank and color (only wild
/// ranks are printed in the Wild color).
pub fn decode_card(code: u16) -> Result<Card, DomainError> {
    if code >= CARD_CODE_LIMIT {
        return Err(DomainError::validation(
            ValidationKind::InvalidCardCode,
            format!("Card code {code} exceeds 9 bits"),
        ));
    }

    let rank = rank_from_code(code >> COLOR_BITS).ok_or_else(|| {
        DomainError::validation(
            ValidationKind::InvalidCardCode,
            format!("Card code {code} has out-of-range rank {}", code >> COLOR_BITS),
        )
    })?;
    let color = color_from_code(code & COLOR_MASK).ok_or_else(|| {
        DomainError::validation(
            ValidationKind::InvalidCardCode,
            format!("Card code {code} has out-of-range color {}", code & COLOR_MASK),
        )
    })?;

    if rank.is_wild() != color.is_wild() {
        return Err(DomainError::validation(
            ValidationKind::InvalidCardCode,
            format!("Card code {code} pairs {rank:?} with {color:?}"),
        ));
    }

    Ok(Card { rank, color })
}

impl From<Card> for u16 {
    fn from(card: Card) -> Self {
        encode_card(card)
    }
}

impl TryFrom<u16> for Card {
    type Error = DomainError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        decode_card(code)
    }
}
