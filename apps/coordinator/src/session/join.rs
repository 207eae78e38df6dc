use tracing::{info, warn};

use super::barrier::{await_barrier, fan_out, Delivery};
use super::{Member, SessionCoordinator, SessionState};
use crate::ack::{Ack, AckPhase, AckWaiter};
use crate::domain::table_rng;
use crate::error::CoordinatorError;
use crate::protocol::{validate_player_name, JoinRequest, JoinResponse, ReadyRequest, ServerPush};

impl SessionCoordinator {
    /// Seat a new player and start the all-pairs join barrier.
    ///
    /// Every existing replica must confirm it learned of the joiner, and the
    /// joiner must confirm each existing replica: 2(n-1) acks for the n-th
    /// player, n(n-1) for the whole table. All of them are registered before
    /// the first push goes out. Returns the roster as it was before the join.
    pub fn join(&self, request: JoinRequest) -> Result<JoinResponse, CoordinatorError> {
        validate_player_name(&request.player_name)?;
        let timeout = self.shared.config.ack_timeout;

        let (existing, waiters, deliveries, tasks, epoch) = {
            let mut core = self.lock();
            self.ensure_open(&core)?;
            self.ensure_state(&core, SessionState::AddingPlayers)?;
            core.table.add_player(&request.player_name)?;

            let joiner = Member {
                name: request.player_name.clone(),
                address: request.advertise_address.clone(),
            };
            let existing = core.members.clone();
            core.members.push(joiner.clone());

            let mut waiters = Vec::with_capacity(existing.len() * 2);
            for member in &existing {
                waiters.push(core.tracker.expect(Ack::join(&joiner.name, &member.name), timeout));
                waiters.push(core.tracker.expect(Ack::join(&member.name, &joiner.name), timeout));
            }

            let mut deliveries: Vec<Delivery> = existing
                .iter()
                .map(|member| Delivery {
                    recipient: member.name.clone(),
                    address: member.address.clone(),
                    message: ServerPush::PlayerJoined {
                        name: joiner.name.clone(),
                    },
                })
                .collect();
            deliveries.push(Delivery {
                recipient: joiner.name.clone(),
                address: joiner.address.clone(),
                message: ServerPush::ExistingPlayersList {
                    names: existing.iter().map(|m| m.name.clone()).collect(),
                },
            });

            info!(
                player = %joiner.name,
                address = %joiner.address,
                seat = existing.len(),
                acks = waiters.len(),
                "Player joined"
            );
            core.joins_in_flight += 1;
            (existing, waiters, deliveries, core.tasks.clone(), core.epoch)
        };

        let this = self.clone();
        self.spawn_phase(tasks, "join", async move {
            this.sync_join(epoch, waiters, deliveries).await;
        });

        Ok(JoinResponse {
            existing_players: existing.into_iter().map(|m| m.name).collect(),
        })
    }

    async fn sync_join(&self, epoch: u64, waiters: Vec<AckWaiter>, deliveries: Vec<Delivery>) {
        fan_out(&self.shared.link, self.shared.config.fanout_deadline, deliveries).await;
        let report = await_barrier(AckPhase::Join, 0, waiters).await;
        // Joins do not change the state; settling records the report and
        // applies the stall policy. The count drops under the same lock so
        // `ready` never sees a finished barrier whose report is unrecorded.
        let mut core = self.lock();
        if core.epoch == epoch {
            core.joins_in_flight = core.joins_in_flight.saturating_sub(1);
        }
        self.settle_locked(&mut core, epoch, SessionState::AddingPlayers, report);
    }

    /// Deal the cards once every join has been confirmed both ways.
    ///
    /// `requester` must be seated. The deal is pushed to every replica as a
    /// table snapshot; once all have acked, the first turn is announced.
    pub fn ready(&self, requester: &str, request: ReadyRequest) -> Result<(), CoordinatorError> {
        let timeout = self.shared.config.ack_timeout;

        let (waiters, deliveries, tasks, epoch) = {
            let mut core = self.lock();
            self.ensure_open(&core)?;
            core.member(requester)?;
            self.ensure_state(&core, SessionState::AddingPlayers)?;

            let pending_joins = core
                .tracker
                .pending_count_where(|ack| ack.is_phase(AckPhase::Join));
            if pending_joins > 0 {
                return Err(CoordinatorError::protocol(
                    core.state,
                    format!("{pending_joins} join acks still outstanding"),
                ));
            }
            if core.joins_in_flight > 0 {
                return Err(CoordinatorError::protocol(
                    core.state,
                    format!("{} join barriers still settling", core.joins_in_flight),
                ));
            }

            let mut rng = table_rng(self.shared.config.seed);
            core.table.shuffle_and_distribute(
                self.shared.config.hand_size,
                &request.shuffler_name,
                request.shuffler_is_first_player,
                &mut rng,
            )?;
            self.set_state(&mut core, SessionState::ReadyToServeCards);

            let snapshot = core.table.snapshot();
            let members = core.members.clone();
            let waiters: Vec<AckWaiter> = members
                .iter()
                .map(|m| core.tracker.expect(Ack::served_cards(&m.name), timeout))
                .collect();
            let deliveries = members
                .into_iter()
                .map(|m| Delivery {
                    recipient: m.name,
                    address: m.address,
                    message: ServerPush::ServedCards {
                        snapshot: snapshot.clone(),
                    },
                })
                .collect();

            info!(
                requester,
                shuffler = %request.shuffler_name,
                players = core.members.len(),
                hand_size = self.shared.config.hand_size,
                "Cards served"
            );
            (waiters, deliveries, core.tasks.clone(), core.epoch)
        };

        let this = self.clone();
        self.spawn_phase(tasks, "served-cards", async move {
            this.sync_served_cards(epoch, waiters, deliveries).await;
        });
        Ok(())
    }

    async fn sync_served_cards(&self, epoch: u64, waiters: Vec<AckWaiter>, deliveries: Vec<Delivery>) {
        let failed = fan_out(&self.shared.link, self.shared.config.fanout_deadline, deliveries).await;
        if !failed.is_empty() {
            warn!(?failed, "Some replicas did not receive the deal");
        }
        let report = await_barrier(AckPhase::ServedCards, 0, waiters).await;
        {
            let Some(mut core) = self.settle(epoch, SessionState::ReadyToServeCards, report) else {
                return;
            };
            self.set_state(&mut core, SessionState::CardsServed);
        }
        self.run_turn(epoch).await;
    }
}
