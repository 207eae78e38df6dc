//! Session coordinator: the single sequencer of one game.
//!
//! Every state and table mutation happens under one `parking_lot` mutex.
//! Anything that waits (pushes, ack barriers, turn pacing) runs on a
//! detached task that re-takes the lock only to apply its result, so an
//! inbound ack never queues behind a waiting transition.

mod barrier;
pub mod builder;
mod join;
mod lifecycle;
pub mod state;
mod turns;


use std::future::Future;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use barrier::BarrierReport;
pub use builder::{build_coordinator, CoordinatorBuilder};
pub use lifecycle::SessionStatus;
pub use state::SessionState;

use crate::ack::AckTracker;
use crate::config::{AckTimeoutPolicy, SessionConfig};
use crate::domain::Table;
use crate::error::CoordinatorError;
use crate::transport::ReplicaLink;

/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct SessionCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    config: SessionConfig,
    link: Arc<dyn ReplicaLink>,
    core: Mutex<Core>,
    state_tx: watch::Sender<SessionState>,
    /// Cancelled once, by `shutdown()`.
    closed: CancellationToken,
}

#[derive(Debug, Clone)]
struct Member {
    name: String,
    address: String,
}

struct Core {
    state: SessionState,
    table: Table,
    members: Vec<Member>,
    tracker: AckTracker,
    decision_counter: u64,
    chosen: Option<String>,
    stalled: bool,
    /// First missing ack of the barrier that stalled the session.
    stall_cause: Option<CoordinatorError>,
    /// Join barriers that have not recorded their report yet. The deal
    /// waits for all of them.
    joins_in_flight: usize,
    /// Operator trigger for the next turn in debug mode. Replaced on
    /// restart so a trigger never outlives its session.
    advance: Arc<Notify>,
    /// Bumped by every restart. Detached tasks carry the epoch they were
    /// started in and give up when it no longer matches.
    epoch: u64,
    /// Cancels the detached tasks of this epoch.
    tasks: CancellationToken,
    last_barrier: Option<BarrierReport>,
}

impl Core {
    fn fresh(epoch: u64, tasks: CancellationToken) -> Self {
        Self {
            state: SessionState::AddingPlayers,
            table: Table::new(),
            members: Vec::new(),
            tracker: AckTracker::new(),
            decision_counter: 0,
            chosen: None,
            stalled: false,
            stall_cause: None,
            joins_in_flight: 0,
            advance: Arc::new(Notify::new()),
            epoch,
            tasks,
            last_barrier: None,
        }
    }

    fn member(&self, identity: &str) -> Result<&Member, CoordinatorError> {
        self.members
            .iter()
            .find(|m| m.name == identity)
            .ok_or_else(|| CoordinatorError::unknown_identity(identity))
    }

    fn player_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }
}

impl SessionCoordinator {
    pub(crate) fn new(config: SessionConfig, link: Arc<dyn ReplicaLink>) -> Self {
        let closed = CancellationToken::new();
        let core = Core::fresh(0, closed.child_token());
        let (state_tx, _) = watch::channel(SessionState::AddingPlayers);
        Self {
            shared: Arc::new(Shared {
                config,
                link,
                core: Mutex::new(core),
                state_tx,
                closed,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.shared.core.lock()
    }

    fn set_state(&self, core: &mut Core, state: SessionState) {
        if core.state != state {
            debug!(from = %core.state, to = %state, "Session state changed");
        }
        core.state = state;
        self.shared.state_tx.send_replace(state);
    }

    /// Reject everything once the session is closed or stalled.
    fn ensure_open(&self, core: &Core) -> Result<(), CoordinatorError> {
        if self.shared.closed.is_cancelled() {
            return Err(CoordinatorError::closed(core.state));
        }
        if core.stalled {
            return Err(CoordinatorError::stalled(core.state));
        }
        Ok(())
    }

    fn ensure_state(&self, core: &Core, expected: SessionState) -> Result<(), CoordinatorError> {
        if core.state != expected {
            return Err(CoordinatorError::protocol(
                core.state,
                format!("Expected session state {expected}"),
            ));
        }
        Ok(())
    }

    /// Run `task` detached, until it finishes or the epoch is cancelled.
    fn spawn_phase<F>(&self, tasks: CancellationToken, phase: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            tokio::select! {
                _ = tasks.cancelled() => debug!(phase, "Phase task cancelled"),
                _ = task => {}
            }
        });
    }

    /// Record a finished barrier. Returns the locked core only when the
    /// session may take its next transition: the epoch and state are still
    /// the ones the barrier was started for, and the report did not stall it.
    fn settle(
        &self,
        epoch: u64,
        expected: SessionState,
        report: BarrierReport,
    ) -> Option<MutexGuard<'_, Core>> {
        let mut core = self.lock();
        self.settle_locked(&mut core, epoch, expected, report)
            .then_some(core)
    }

    fn settle_locked(
        &self,
        core: &mut Core,
        epoch: u64,
        expected: SessionState,
        report: BarrierReport,
    ) -> bool {
        if core.epoch != epoch || core.state != expected {
            debug!(
                phase = %report.phase,
                state = %core.state,
                "Barrier finished after the session moved on"
            );
            return false;
        }
        let cause = report.timeout_error();
        core.last_barrier = Some(report);
        match cause {
            Some(cause) if self.shared.config.ack_timeout_policy == AckTimeoutPolicy::Stall => {
                warn!(state = %core.state, error = %cause, "Session stalled on missing acks; restart required");
                core.stalled = true;
                core.stall_cause = Some(cause);
                false
            }
            _ => true,
        }
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.lock();
        f.debug_struct("SessionCoordinator")
            .field("state", &core.state)
            .field("players", &core.members.len())
            .field("decision_counter", &core.decision_counter)
            .finish()
    }
}
