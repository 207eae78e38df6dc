use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{BarrierReport, Core, SessionCoordinator, SessionState};
use crate::ack::Ack;
use crate::domain::TableSnapshot;
use crate::error::CoordinatorError;

/// Point-in-time view of a session for operators and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub players: Vec<String>,
    pub chosen_player: Option<String>,
    pub decision_counter: u64,
    pub pending_acks: usize,
    pub winner: Option<String>,
    pub stalled: bool,
    pub epoch: u64,
    pub last_barrier: Option<BarrierReport>,
}

impl SessionCoordinator {
    /// Resolve one ack from a seated replica. Returns whether it matched a
    /// pending entry; late and duplicate acks are dropped.
    pub fn acknowledge(&self, ack: &Ack) -> Result<bool, CoordinatorError> {
        let tracker = {
            let core = self.lock();
            if self.shared.closed.is_cancelled() {
                return Err(CoordinatorError::closed(core.state));
            }
            core.member(&ack.acker)?;
            core.tracker.clone()
        };
        Ok(tracker.notify_ack(ack))
    }

    pub fn status(&self) -> SessionStatus {
        let core = self.lock();
        SessionStatus {
            state: core.state,
            players: core.player_names(),
            chosen_player: core.chosen.clone(),
            decision_counter: core.decision_counter,
            pending_acks: core.tracker.pending_count(),
            winner: core.table.winner().map(str::to_string),
            stalled: core.stalled,
            epoch: core.epoch,
            last_barrier: core.last_barrier.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_stalled(&self) -> bool {
        self.lock().stalled
    }

    /// Why the session stalled: the first ack its barrier missed.
    pub fn stall_cause(&self) -> Option<CoordinatorError> {
        self.lock().stall_cause.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    pub fn pending_ack_ids(&self) -> Vec<String> {
        let tracker = self.lock().tracker.clone();
        tracker.list_pending_ids()
    }

    /// The authoritative table, hands included.
    pub fn snapshot(&self) -> TableSnapshot {
        self.lock().table.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Wait until the session enters `target`. Fails if the session is shut
    /// down first.
    pub async fn wait_for_state(&self, target: SessionState) -> Result<(), CoordinatorError> {
        let mut rx = self.subscribe();
        tokio::select! {
            res = rx.wait_for(|state| *state == target) => {
                res.map(|_| ()).map_err(|_| CoordinatorError::closed(self.state()))
            }
            _ = self.shared.closed.cancelled() => Err(CoordinatorError::closed(self.state())),
        }
    }

    /// Follow the session until it has a winner, stalls, completes
    /// `max_turns` turns or goes `idle` without a state change. Returns the
    /// status at that point.
    pub async fn wait_for_end(&self, max_turns: u64, idle: Duration) -> SessionStatus {
        let mut states = self.subscribe();
        loop {
            let status = self.status();
            if status.state == SessionState::HaveWinner {
                info!(winner = ?status.winner, turns = status.decision_counter, "Game over");
                return status;
            }
            if status.stalled || self.is_closed() || status.decision_counter >= max_turns {
                warn!(state = %status.state, turns = status.decision_counter, "Stopped without a winner");
                return status;
            }
            match tokio::time::timeout(idle, states.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => return self.status(),
                Err(_) => {
                    warn!(
                        state = %status.state,
                        turns = status.decision_counter,
                        idle_ms = idle.as_millis() as u64,
                        "Session went idle"
                    );
                    return self.status();
                }
            }
        }
    }

    /// Throw the session away and start over: new table, empty roster, fresh
    /// ack registry, counter back to 0. In-flight pushes and barriers of the
    /// old session are cancelled.
    pub fn restart(&self) -> Result<(), CoordinatorError> {
        let (old, epoch) = {
            let mut core = self.lock();
            if self.shared.closed.is_cancelled() {
                return Err(CoordinatorError::closed(core.state));
            }
            core.tasks.cancel();
            let epoch = core.epoch + 1;
            let fresh = Core::fresh(epoch, self.shared.closed.child_token());
            let old = std::mem::replace(&mut *core, fresh);
            self.set_state(&mut core, SessionState::AddingPlayers);
            (old, epoch)
        };
        let dropped = old.tracker.clear();
        info!(epoch, dropped_acks = dropped, previous_state = %old.state, "Session restarted");
        Ok(())
    }

    /// Stop the session for good. Every later request fails with
    /// `SESSION_CLOSED`.
    pub fn shutdown(&self) {
        if self.shared.closed.is_cancelled() {
            debug!("Session already shut down");
            return;
        }
        self.shared.closed.cancel();
        let tracker = self.lock().tracker.clone();
        let dropped = tracker.clear();
        info!(dropped_acks = dropped, "Session shut down");
    }
}
