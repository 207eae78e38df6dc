//! In-process link: one unbounded channel per registered address.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::ReplicaLink;
use crate::error::CoordinatorError;
use crate::protocol::ServerPush;

pub type Inbox = mpsc::UnboundedReceiver<ServerPush>;

struct Endpoint {
    token: Uuid,
    tx: mpsc::UnboundedSender<ServerPush>,
}

#[derive(Default)]
pub struct ChannelLink {
    endpoints: DashMap<String, Endpoint>,
}

impl ChannelLink {
    pub fn new() -> Self {
        Self {
            endpoints: DashMap::new(),
        }
    }

    /// Listen on `address`. A later registration of the same address
    /// replaces this one.
    pub fn register(&self, address: &str) -> (Uuid, Inbox) {
        let token = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        if self
            .endpoints
            .insert(address.to_string(), Endpoint { token, tx })
            .is_some()
        {
            debug!(address, "Replaced existing endpoint");
        }
        (token, rx)
    }

    /// Stop listening, unless the address has been re-registered since.
    pub fn unregister(&self, address: &str, token: Uuid) {
        self.endpoints
            .remove_if(address, |_, endpoint| endpoint.token == token);
    }

    pub fn is_registered(&self, address: &str) -> bool {
        self.endpoints.contains_key(address)
    }
}

#[async_trait]
impl ReplicaLink for ChannelLink {
    async fn push(&self, address: &str, message: ServerPush) -> Result<(), CoordinatorError> {
        let Some(endpoint) = self.endpoints.get(address) else {
            return Err(CoordinatorError::link(address, "No endpoint registered"));
        };
        let kind = message.kind();
        endpoint.tx.send(message).map_err(|_| {
            warn!(address, kind, "Endpoint inbox closed");
            CoordinatorError::link(address, "Endpoint inbox closed")
        })
    }
}
