//! Seat and turn math.
//!
//! Every layer (engine, coordinator, replicas) shares these helpers so there
//! is a single source of truth for rotation and "who acts next".

use serde::{Deserialize, Serialize};

/// Zero-based seat index in join order.
pub type Seat = usize;

/// Play direction. Clockwise walks seats upward (+1).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn step(self) -> isize {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// Per-turn progress of the acting player.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    #[default]
    Start,
    /// One card pulled; only a play or a pass may follow.
    CardDrawn,
    /// A wild card is down and its color has not been chosen yet.
    CardPlayed,
}

#[inline]
pub fn seat_offset(seat: Seat, delta: isize, players: usize) -> Seat {
    debug_assert!(players > 0, "seat math needs at least one player");
    (seat as isize + delta).rem_euclid(players as isize) as Seat
}

/// The seat `n` steps from `seat` in `direction`.
#[inline]
pub fn nth_seat(seat: Seat, n: usize, direction: Direction, players: usize) -> Seat {
    seat_offset(seat, direction.step() * n as isize, players)
}

#[inline]
pub fn next_seat(seat: Seat, direction: Direction, players: usize) -> Seat {
    nth_seat(seat, 1, direction, players)
}
