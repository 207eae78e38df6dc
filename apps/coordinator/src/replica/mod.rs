//! In-process replicas: each keeps its own copy of the table, applies the
//! coordinator's pushes, acks them, and plays its turns through a
//! [`DecisionMaker`].

pub mod decision_maker;
pub mod greedy;
pub mod random;
pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use decision_maker::{DecisionError, DecisionMaker};
pub use greedy::GreedyBot;
pub use random::RandomBot;
pub use registry::{by_name, registered_bots, BotFactory};

use crate::domain::{PlayerDecision, Table, TableSnapshot};
use crate::error::CoordinatorError;
use crate::errors::domain::DomainError;
use crate::protocol::{JoinRequest, PlayerDecisions, ServerPush};
use crate::session::SessionCoordinator;
use crate::transport::channel::{ChannelLink, Inbox};

/// Upper bound on the decisions a bot may chain in one turn.
pub const MAX_DECISIONS_PER_TURN: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct ReplicaOptions {
    /// Delay between submissions the coordinator refused as "not yet".
    pub retry_backoff: Duration,
    pub max_submit_attempts: u32,
}

impl Default for ReplicaOptions {
    fn default() -> Self {
        Self {
            retry_backoff: Duration::from_millis(25),
            max_submit_attempts: 2_000,
        }
    }
}

struct Replica {
    name: String,
    coordinator: SessionCoordinator,
    maker: Box<dyn DecisionMaker>,
    options: ReplicaOptions,
    table: Arc<Mutex<Table>>,
    roster: Arc<Mutex<Vec<String>>>,
}

/// A running replica. Dropping the handle leaves the task running; call
/// [`ReplicaHandle::shutdown`] to stop it.
pub struct ReplicaHandle {
    name: String,
    address: String,
    table: Arc<Mutex<Table>>,
    roster: Arc<Mutex<Vec<String>>>,
    link: Arc<ChannelLink>,
    token: Uuid,
    task: JoinHandle<()>,
}

impl ReplicaHandle {
    /// Listen on `mem://{name}`, start the replica loop and join the session.
    pub fn spawn(
        coordinator: &SessionCoordinator,
        link: &Arc<ChannelLink>,
        name: &str,
        maker: Box<dyn DecisionMaker>,
        options: ReplicaOptions,
    ) -> Result<Self, CoordinatorError> {
        let address = format!("mem://{name}");
        let (token, inbox) = link.register(&address);

        let table = Arc::new(Mutex::new(Table::new()));
        let roster = Arc::new(Mutex::new(Vec::new()));
        let replica = Replica {
            name: name.to_string(),
            coordinator: coordinator.clone(),
            maker,
            options,
            table: Arc::clone(&table),
            roster: Arc::clone(&roster),
        };
        let task = tokio::spawn(replica.run(inbox));

        let joined = coordinator.join(JoinRequest {
            player_name: name.to_string(),
            advertise_address: address.clone(),
        });
        if let Err(err) = joined {
            task.abort();
            link.unregister(&address, token);
            return Err(err);
        }

        Ok(Self {
            name: name.to_string(),
            address,
            table,
            roster,
            link: Arc::clone(link),
            token,
            task,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// This replica's copy of the table.
    pub fn snapshot(&self) -> TableSnapshot {
        self.table.lock().snapshot()
    }

    /// Players this replica has been told about, itself included.
    pub fn roster(&self) -> Vec<String> {
        self.roster.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub async fn shutdown(self) {
        self.link.unregister(&self.address, self.token);
        self.task.abort();
        let _ = self.task.await;
    }
}

impl Replica {
    async fn run(self, mut inbox: Inbox) {
        while let Some(push) = inbox.recv().await {
            let kind = push.kind();
            if let Err(err) = self.apply(&push) {
                // No ack: the coordinator's barrier reports the miss.
                warn!(replica = %self.name, kind, error = %err, "Push could not be applied");
                continue;
            }
            for ack in push.acks_for(&self.name) {
                if let Err(err) = self.coordinator.acknowledge(&ack) {
                    warn!(replica = %self.name, ack_id = %ack.ack_id, error = %err, "Ack refused");
                }
            }
            if let ServerPush::ChosenPlayer {
                name,
                decision_counter,
            } = &push
            {
                if *name == self.name {
                    self.play_turn(*decision_counter).await;
                }
            }
        }
        debug!(replica = %self.name, "Inbox closed");
    }

    fn apply(&self, push: &ServerPush) -> Result<(), DomainError> {
        match push {
            ServerPush::PlayerJoined { name } => {
                let mut roster = self.roster.lock();
                if !roster.contains(name) {
                    roster.push(name.clone());
                }
            }
            ServerPush::ExistingPlayersList { names } => {
                let mut roster = self.roster.lock();
                let later: Vec<String> = roster
                    .drain(..)
                    .filter(|n| !names.contains(n) && *n != self.name)
                    .collect();
                roster.extend(names.iter().cloned());
                roster.push(self.name.clone());
                roster.extend(later);
            }
            ServerPush::ServedCards { snapshot } => {
                let table = Table::from_snapshot(snapshot.clone())?;
                *self.roster.lock() = table.players().to_vec();
                *self.table.lock() = table;
            }
            ServerPush::ChosenPlayer { name, .. } => {
                let chosen = self.table.lock().begin_turn()?;
                if chosen != *name {
                    return Err(DomainError::validation_other(format!(
                        "Coordinator chose {name}, local table chose {chosen}"
                    )));
                }
            }
            ServerPush::PlayerDecisionsSync(sync) => {
                self.table
                    .lock()
                    .eval_turn(&sync.deciding_player, &sync.decisions)?;
            }
        }
        Ok(())
    }

    /// Decide the whole turn on a scratch copy, submit it, and adopt the
    /// scratch table once the coordinator accepts.
    async fn play_turn(&self, decision_counter: u64) {
        let (decisions, scratch) = match self.plan_turn() {
            Ok(planned) => planned,
            Err(err) => {
                warn!(replica = %self.name, error = %err, "Could not plan turn");
                return;
            }
        };
        let submission = PlayerDecisions {
            deciding_player: self.name.clone(),
            decision_counter,
            decisions,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.coordinator.submit_decisions(submission.clone()) {
                Ok(outcomes) => {
                    debug!(
                        replica = %self.name,
                        decision_counter,
                        decisions = outcomes.len(),
                        attempt,
                        "Turn accepted"
                    );
                    if let Some(winner) = scratch.winner() {
                        info!(replica = %self.name, winner, "Played the winning card");
                    }
                    *self.table.lock() = scratch;
                    return;
                }
                Err(err) if err.is_retryable() && attempt < self.options.max_submit_attempts => {
                    tokio::time::sleep(self.options.retry_backoff).await;
                }
                Err(err) => {
                    warn!(
                        replica = %self.name,
                        decision_counter,
                        attempt,
                        code = err.code().as_str(),
                        error = %err,
                        "Turn rejected"
                    );
                    return;
                }
            }
        }
    }

    fn plan_turn(&self) -> Result<(Vec<PlayerDecision>, Table), DecisionError> {
        let mut scratch = self.table.lock().clone();
        let mut decisions = Vec::new();
        while !scratch.turn_complete() && scratch.winner().is_none() {
            if decisions.len() >= MAX_DECISIONS_PER_TURN {
                return Err(DecisionError::Runaway(decisions.len()));
            }
            let decision = self.maker.decide(&scratch, &self.name)?;
            scratch
                .eval_decision(&self.name, &decision)
                .map_err(|err| DecisionError::InvalidMove(err.to_string()))?;
            decisions.push(decision);
        }
        Ok((decisions, scratch))
    }
}
