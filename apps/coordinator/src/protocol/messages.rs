//! Typed message set. Encoding on the wire is the transport's concern; every
//! message here is serde-serializable so any encoding will do.

use serde::{Deserialize, Serialize};

use crate::ack::{Ack, COORDINATOR_IDENTITY};
use crate::domain::{PlayerDecision, TableSnapshot};
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub player_name: String,
    /// Where the coordinator pushes messages for this player.
    pub advertise_address: String,
}

/// Roster as it was before the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub existing_players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyRequest {
    pub shuffler_name: String,
    #[serde(default)]
    pub shuffler_is_first_player: bool,
}

/// One turn's worth of decisions from the chosen player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDecisions {
    pub deciding_player: String,
    pub decision_counter: u64,
    pub decisions: Vec<PlayerDecision>,
}

/// Everything the coordinator pushes to a replica. Each push is confirmed by
/// the acks returned from [`ServerPush::acks_for`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerPush {
    PlayerJoined { name: String },
    ExistingPlayersList { names: Vec<String> },
    ServedCards { snapshot: TableSnapshot },
    ChosenPlayer { name: String, decision_counter: u64 },
    PlayerDecisionsSync(PlayerDecisions),
}

impl ServerPush {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::ExistingPlayersList { .. } => "existing_players_list",
            Self::ServedCards { .. } => "served_cards",
            Self::ChosenPlayer { .. } => "chosen_player",
            Self::PlayerDecisionsSync(_) => "player_decisions_sync",
        }
    }

    /// Acks `recipient` owes the coordinator once it has applied this push.
    pub fn acks_for(&self, recipient: &str) -> Vec<Ack> {
        match self {
            Self::PlayerJoined { name } => vec![Ack::join(name, recipient)],
            Self::ExistingPlayersList { names } => {
                names.iter().map(|name| Ack::join(name, recipient)).collect()
            }
            Self::ServedCards { .. } => vec![Ack::served_cards(recipient)],
            Self::ChosenPlayer {
                decision_counter, ..
            } => vec![Ack::chosen_player(recipient, *decision_counter)],
            Self::PlayerDecisionsSync(sync) => vec![Ack::decision_sync(
                &sync.deciding_player,
                recipient,
                sync.decision_counter,
            )],
        }
    }
}

const RESERVED_CHARS: [char; 3] = [':', '>', '#'];

/// Player names end up inside ack ids, so the id delimiters are banned, as
/// is the coordinator's own identity.
pub fn validate_player_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() || name.trim() != name {
        return Err(DomainError::validation(
            ValidationKind::InvalidPlayerName,
            format!("Player name {name:?} is empty or padded with whitespace"),
        ));
    }
    if name.contains(RESERVED_CHARS) {
        return Err(DomainError::validation(
            ValidationKind::InvalidPlayerName,
            format!("Player name {name:?} contains one of {RESERVED_CHARS:?}"),
        ));
    }
    if name == COORDINATOR_IDENTITY {
        return Err(DomainError::validation(
            ValidationKind::InvalidPlayerName,
            format!("{COORDINATOR_IDENTITY:?} is reserved"),
        ));
    }
    Ok(())
}
