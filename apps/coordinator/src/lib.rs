#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod ack;
pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod protocol;
pub mod replica;
pub mod session;
pub mod transport;


// Re-exports for public API
pub use ack::{Ack, AckOutcome, AckPhase, AckTracker, AckWaiter, COORDINATOR_IDENTITY};
pub use config::{AckTimeoutPolicy, SessionConfig};
pub use domain::{Card, Color, DecisionKind, PlayerDecision, Rank, Table, TableSnapshot};
pub use error::CoordinatorError;
pub use errors::{DomainError, ErrorCode};
pub use protocol::{JoinRequest, JoinResponse, PlayerDecisions, ReadyRequest, ServerPush};
pub use replica::{DecisionMaker, GreedyBot, RandomBot, ReplicaHandle, ReplicaOptions};
pub use session::{build_coordinator, SessionCoordinator, SessionState, SessionStatus};
pub use transport::{ChannelLink, ReplicaLink};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
