use std::sync::Arc;

use tracing::{debug, error, info};

use super::barrier::{await_barrier, fan_out, Delivery};
use super::{SessionCoordinator, SessionState};
use crate::ack::{Ack, AckPhase, AckWaiter};
use crate::domain::DecisionOutcome;
use crate::error::CoordinatorError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::protocol::{PlayerDecisions, ServerPush};

impl SessionCoordinator {
    /// Let the next turn start. Only meaningful in debug mode, where turns
    /// wait for this instead of the configured pause. A trigger sent before
    /// anyone waits is kept for the next turn of the same session; a restart
    /// discards it.
    pub fn advance(&self) {
        self.lock().advance.notify_one();
    }

    async fn pace(&self, epoch: u64) {
        if self.shared.config.debug_mode {
            let trigger = {
                let core = self.lock();
                if core.epoch != epoch {
                    return;
                }
                Arc::clone(&core.advance)
            };
            trigger.notified().await;
        } else {
            tokio::time::sleep(self.shared.config.turn_pause).await;
        }
    }

    /// Pause, choose the player-of-next-turn and wait for every replica to
    /// confirm the choice.
    pub(super) async fn run_turn(&self, epoch: u64) {
        self.pace(epoch).await;
        let timeout = self.shared.config.ack_timeout;

        let (counter, waiters, deliveries) = {
            let mut core = self.lock();
            let ready = matches!(
                core.state,
                SessionState::CardsServed | SessionState::DoneSyncingPlayerDecision
            );
            if core.epoch != epoch || core.stalled || !ready {
                debug!(state = %core.state, "Turn start abandoned");
                return;
            }
            let chosen = match core.table.begin_turn() {
                Ok(name) => name,
                Err(err) => {
                    error!(error = %err, "Table refused to begin a turn");
                    return;
                }
            };
            let counter = core.decision_counter;
            self.set_state(&mut core, SessionState::PlayerChosenForTurn);
            core.chosen = Some(chosen.clone());

            let members = core.members.clone();
            let waiters: Vec<AckWaiter> = members
                .iter()
                .map(|m| core.tracker.expect(Ack::chosen_player(&m.name, counter), timeout))
                .collect();
            let deliveries: Vec<Delivery> = members
                .into_iter()
                .map(|m| Delivery {
                    recipient: m.name,
                    address: m.address,
                    message: ServerPush::ChosenPlayer {
                        name: chosen.clone(),
                        decision_counter: counter,
                    },
                })
                .collect();

            info!(player = %chosen, decision_counter = counter, "Player chosen for turn");
            (counter, waiters, deliveries)
        };

        fan_out(&self.shared.link, self.shared.config.fanout_deadline, deliveries).await;
        let report = await_barrier(AckPhase::ChosenPlayer, counter, waiters).await;

        if let Some(mut core) = self.settle(epoch, SessionState::PlayerChosenForTurn, report) {
            let next = if core.table.awaiting_challenge() {
                SessionState::WaitingForChallengeDecision
            } else {
                SessionState::WaitingForPlayerDecision
            };
            self.set_state(&mut core, next);
        }
    }

    /// Apply one turn's decisions from the chosen player, then replay them
    /// on every other replica.
    ///
    /// The batch is all-or-nothing and must finish the turn. Rejections
    /// carry the decision kinds the player may submit instead.
    pub fn submit_decisions(
        &self,
        submission: PlayerDecisions,
    ) -> Result<Vec<DecisionOutcome>, CoordinatorError> {
        let timeout = self.shared.config.ack_timeout;
        let player = submission.deciding_player.as_str();

        let (outcomes, waiters, deliveries, tasks, epoch) = {
            let mut core = self.lock();
            self.ensure_open(&core)?;
            core.member(player)?;
            if !core.state.accepts_decisions() {
                return Err(CoordinatorError::protocol(
                    core.state,
                    "Not waiting for player decisions",
                ));
            }
            if core.chosen.as_deref() != Some(player) {
                return Err(CoordinatorError::rejected(
                    DomainError::validation(
                        ValidationKind::OutOfTurn,
                        format!(
                            "Waiting on {}, not {player}",
                            core.chosen.as_deref().unwrap_or("nobody")
                        ),
                    ),
                    Vec::new(),
                ));
            }
            if submission.decision_counter != core.decision_counter {
                return Err(CoordinatorError::stale_counter(
                    core.state,
                    core.decision_counter,
                    submission.decision_counter,
                ));
            }

            let outcomes = match core.table.eval_turn(player, &submission.decisions) {
                Ok(outcomes) => outcomes,
                Err(err) => {
                    let eligible = core.table.eligible_decisions(player);
                    info!(player, error = %err, ?eligible, "Decisions rejected");
                    return Err(CoordinatorError::rejected(err, eligible));
                }
            };
            self.set_state(&mut core, SessionState::SyncingPlayerDecision);

            let counter = core.decision_counter;
            let others: Vec<_> = core
                .members
                .iter()
                .filter(|m| m.name != player)
                .cloned()
                .collect();
            let waiters: Vec<AckWaiter> = others
                .iter()
                .map(|m| core.tracker.expect(Ack::decision_sync(player, &m.name, counter), timeout))
                .collect();
            let deliveries: Vec<Delivery> = others
                .into_iter()
                .map(|m| Delivery {
                    recipient: m.name,
                    address: m.address,
                    message: ServerPush::PlayerDecisionsSync(submission.clone()),
                })
                .collect();

            info!(
                player,
                decision_counter = counter,
                decisions = submission.decisions.len(),
                "Decisions applied"
            );
            (outcomes, waiters, deliveries, core.tasks.clone(), core.epoch)
        };

        let this = self.clone();
        let counter = submission.decision_counter;
        self.spawn_phase(tasks, "decision-sync", async move {
            this.sync_decisions(epoch, counter, waiters, deliveries).await;
        });
        Ok(outcomes)
    }

    async fn sync_decisions(
        &self,
        epoch: u64,
        counter: u64,
        waiters: Vec<AckWaiter>,
        deliveries: Vec<Delivery>,
    ) {
        fan_out(&self.shared.link, self.shared.config.fanout_deadline, deliveries).await;
        let report = await_barrier(AckPhase::DecisionSync, counter, waiters).await;

        let game_on = {
            let Some(mut core) = self.settle(epoch, SessionState::SyncingPlayerDecision, report) else {
                return;
            };
            self.set_state(&mut core, SessionState::DoneSyncingPlayerDecision);
            core.decision_counter += 1;
            core.chosen = None;
            match core.table.winner().map(str::to_string) {
                Some(winner) => {
                    self.set_state(&mut core, SessionState::HaveWinner);
                    info!(winner = %winner, rounds = core.decision_counter, "Game won");
                    false
                }
                None => true,
            }
        };
        if game_on {
            self.run_turn(epoch).await;
        }
    }
}
