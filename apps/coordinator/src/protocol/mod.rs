//! Messages exchanged between the coordinator and player replicas.

pub mod messages;

pub use messages::{
    validate_player_name, JoinRequest, JoinResponse, PlayerDecisions, ReadyRequest, ServerPush,
};
