//! Fan-out and ack barriers around each session transition.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::ack::{Ack, AckOutcome, AckPhase, AckWaiter};
use crate::error::CoordinatorError;
use crate::protocol::ServerPush;
use crate::transport::ReplicaLink;

/// One push addressed to one replica.
#[derive(Debug, Clone)]
pub(crate) struct Delivery {
    pub recipient: String,
    pub address: String,
    pub message: ServerPush,
}

/// Which acks of one barrier arrived and which timed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarrierReport {
    pub phase: AckPhase,
    pub decision_counter: u64,
    pub acked: Vec<Ack>,
    pub timed_out: Vec<Ack>,
}

impl BarrierReport {
    pub fn is_complete(&self) -> bool {
        self.timed_out.is_empty()
    }

    /// The first missing ack as an error, if any ack timed out.
    pub fn timeout_error(&self) -> Option<CoordinatorError> {
        self.timed_out
            .first()
            .map(|ack| CoordinatorError::ack_timeout(&ack.ack_id, &ack.acker))
    }

    /// Replicas that missed at least one ack, in first-miss order.
    pub fn missing_ackers(&self) -> Vec<&str> {
        let mut ackers: Vec<&str> = Vec::new();
        for ack in &self.timed_out {
            if !ackers.contains(&ack.acker.as_str()) {
                ackers.push(&ack.acker);
            }
        }
        ackers
    }
}

/// Push every delivery concurrently, each under `deadline`. Returns the
/// recipients whose push failed; their acks will time out on their own.
pub(crate) async fn fan_out(
    link: &Arc<dyn ReplicaLink>,
    deadline: Duration,
    deliveries: Vec<Delivery>,
) -> Vec<String> {
    let sends = deliveries.into_iter().map(|delivery| {
        let link = Arc::clone(link);
        async move {
            let Delivery {
                recipient,
                address,
                message,
            } = delivery;
            let kind = message.kind();
            match tokio::time::timeout(deadline, link.push(&address, message)).await {
                Ok(Ok(())) => None,
                Ok(Err(err)) => {
                    warn!(recipient = %recipient, kind, error = %err, "Push failed");
                    Some(recipient)
                }
                Err(_) => {
                    warn!(
                        recipient = %recipient,
                        kind,
                        deadline_ms = deadline.as_millis() as u64,
                        "Push missed its deadline"
                    );
                    Some(recipient)
                }
            }
        }
    });
    join_all(sends).await.into_iter().flatten().collect()
}

/// Wait until every ack of the barrier has resolved.
pub(crate) async fn await_barrier(
    phase: AckPhase,
    decision_counter: u64,
    waiters: Vec<AckWaiter>,
) -> BarrierReport {
    let acks: Vec<Ack> = waiters.iter().map(|w| w.ack().clone()).collect();
    let outcomes = join_all(waiters).await;

    let mut report = BarrierReport {
        phase,
        decision_counter,
        acked: Vec::new(),
        timed_out: Vec::new(),
    };
    for (ack, outcome) in acks.into_iter().zip(outcomes) {
        match outcome {
            AckOutcome::Acked => report.acked.push(ack),
            AckOutcome::TimedOut => report.timed_out.push(ack),
        }
    }

    if report.is_complete() {
        debug!(%phase, decision_counter, acks = report.acked.len(), "Barrier complete");
    } else {
        warn!(
            %phase,
            decision_counter,
            missing = ?report.missing_ackers(),
            timed_out = report.timed_out.len(),
            "Barrier finished with missing acks"
        );
    }
    report
}
