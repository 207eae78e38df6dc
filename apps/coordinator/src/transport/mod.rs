//! Outbound path from the coordinator to replicas.

use async_trait::async_trait;

use crate::error::CoordinatorError;
use crate::protocol::ServerPush;

pub mod channel;

pub use channel::ChannelLink;

/// Delivers one push to the replica listening at `address`.
///
/// Returning `Ok` means the message was handed over, not that it was
/// applied; application is confirmed by acks.
#[async_trait]
pub trait ReplicaLink: Send + Sync {
    async fn push(&self, address: &str, message: ServerPush) -> Result<(), CoordinatorError>;
}
