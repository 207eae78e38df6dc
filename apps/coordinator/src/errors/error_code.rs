//! Error codes for the session coordinator.
//!
//! Every rejection the coordinator hands back to a replica or an operator
//! carries one of these codes. Add new codes here; never pass ad-hoc strings
//! as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that
//! appear in rejection payloads and logs.

use core::fmt;

use super::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};

/// Centralized error codes for the session coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Decision validation
    /// Player already drew a card this turn
    AlreadyDrewCard,
    /// Draw pile is empty
    DeckEmpty,
    /// Discard pile cannot give a card
    PileEmpty,
    /// Card not in hand
    CardNotInHand,
    /// Card does not match the discard top or the required color
    IllegalPlay,
    /// Chosen color is not a playable color
    IllegalColor,
    /// PlayHandCard without a card
    MissingCard,
    /// WildColorChoice without a color
    MissingColor,
    /// Pass before drawing while a pile can still supply a card
    MustDrawFirst,
    /// Out of turn
    OutOfTurn,
    /// Decision kind not valid in the current turn phase
    UnexpectedDecision,
    /// Decision batch left the turn unfinished
    IncompleteTurn,
    /// A turn is already in progress
    TurnInProgress,
    /// Hand size outside of 1..=12 or larger than the deck allows
    InvalidHandSize,
    /// Player name empty or malformed
    InvalidPlayerName,
    /// Fewer than two players at the table
    NotEnoughPlayers,
    /// Cards have not been dealt yet
    NotShuffled,
    /// Game already has a winner
    GameOver,
    /// Encoded card outside of the 9-bit card space
    InvalidCardCode,
    /// Table snapshot fails its invariants
    SnapshotInvalid,
    /// General validation error
    ValidationError,

    // Conflicts
    /// Player name already registered
    DuplicatePlayer,
    /// Cards were already dealt
    AlreadyShuffled,
    /// Generic conflict
    Conflict,

    // Lookup
    /// Player not found at the table
    PlayerNotFound,
    /// Sender does not resolve to a roster entry
    UnknownIdentity,

    // Protocol
    /// Request arrived while the session is in another state
    ProtocolState,
    /// Decision counter does not match the current round
    StaleDecisionCounter,
    /// Session stalled after an ack timeout
    SessionStalled,
    /// Session has been shut down
    SessionClosed,
    /// Acknowledgment timed out
    AckTimeout,

    // System
    /// Push to a replica failed or missed its deadline
    LinkError,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyDrewCard => "ALREADY_DREW_CARD",
            Self::DeckEmpty => "DECK_EMPTY",
            Self::PileEmpty => "PILE_EMPTY",
            Self::CardNotInHand => "CARD_NOT_IN_HAND",
            Self::IllegalPlay => "ILLEGAL_PLAY",
            Self::IllegalColor => "ILLEGAL_COLOR",
            Self::MissingCard => "MISSING_CARD",
            Self::MissingColor => "MISSING_COLOR",
            Self::MustDrawFirst => "MUST_DRAW_FIRST",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::UnexpectedDecision => "UNEXPECTED_DECISION",
            Self::IncompleteTurn => "INCOMPLETE_TURN",
            Self::TurnInProgress => "TURN_IN_PROGRESS",
            Self::InvalidHandSize => "INVALID_HAND_SIZE",
            Self::InvalidPlayerName => "INVALID_PLAYER_NAME",
            Self::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            Self::NotShuffled => "NOT_SHUFFLED",
            Self::GameOver => "GAME_OVER",
            Self::InvalidCardCode => "INVALID_CARD_CODE",
            Self::SnapshotInvalid => "SNAPSHOT_INVALID",
            Self::ValidationError => "VALIDATION_ERROR",

            Self::DuplicatePlayer => "DUPLICATE_PLAYER",
            Self::AlreadyShuffled => "ALREADY_SHUFFLED",
            Self::Conflict => "CONFLICT",

            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::UnknownIdentity => "UNKNOWN_IDENTITY",

            Self::ProtocolState => "PROTOCOL_STATE",
            Self::StaleDecisionCounter => "STALE_DECISION_COUNTER",
            Self::SessionStalled => "SESSION_STALLED",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::AckTimeout => "ACK_TIMEOUT",

            Self::LinkError => "LINK_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&ValidationKind> for ErrorCode {
    fn from(kind: &ValidationKind) -> Self {
        match kind {
            ValidationKind::AlreadyDrewCard => Self::AlreadyDrewCard,
            ValidationKind::DeckEmpty => Self::DeckEmpty,
            ValidationKind::PileEmpty => Self::PileEmpty,
            ValidationKind::CardNotInHand => Self::CardNotInHand,
            ValidationKind::IllegalPlay => Self::IllegalPlay,
            ValidationKind::IllegalColor => Self::IllegalColor,
            ValidationKind::MissingCard => Self::MissingCard,
            ValidationKind::MissingColor => Self::MissingColor,
            ValidationKind::MustDrawFirst => Self::MustDrawFirst,
            ValidationKind::OutOfTurn => Self::OutOfTurn,
            ValidationKind::UnexpectedDecision => Self::UnexpectedDecision,
            ValidationKind::IncompleteTurn => Self::IncompleteTurn,
            ValidationKind::TurnInProgress => Self::TurnInProgress,
            ValidationKind::InvalidHandSize => Self::InvalidHandSize,
            ValidationKind::InvalidPlayerName => Self::InvalidPlayerName,
            ValidationKind::NotEnoughPlayers => Self::NotEnoughPlayers,
            ValidationKind::NotShuffled => Self::NotShuffled,
            ValidationKind::GameOver => Self::GameOver,
            ValidationKind::InvalidCardCode => Self::InvalidCardCode,
            ValidationKind::SnapshotInvalid => Self::SnapshotInvalid,
            ValidationKind::Other(_) => Self::ValidationError,
        }
    }
}

impl From<&DomainError> for ErrorCode {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::Validation(kind, _) => kind.into(),
            DomainError::Conflict(ConflictKind::DuplicatePlayer, _) => Self::DuplicatePlayer,
            DomainError::Conflict(ConflictKind::AlreadyShuffled, _) => Self::AlreadyShuffled,
            DomainError::Conflict(ConflictKind::Other(_), _) => Self::Conflict,
            DomainError::NotFound(NotFoundKind::Player, _) => Self::PlayerNotFound,
            DomainError::NotFound(NotFoundKind::Other(_), _) => Self::PlayerNotFound,
        }
    }
}
