//! Acknowledgment tracking: bounded-wait, exactly-once delivery confirmation.

pub mod ack_id;
pub mod tracker;

pub use ack_id::{Ack, AckPhase, COORDINATOR_IDENTITY};
pub use tracker::{AckOutcome, AckTracker, AckWaiter};
