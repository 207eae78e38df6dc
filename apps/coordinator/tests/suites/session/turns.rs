use uno_coordinator::domain::Deck;
use uno_coordinator::replica::{DecisionMaker, GreedyBot};
use uno_coordinator::{
    ErrorCode, PlayerDecision, PlayerDecisions, SessionState, Table, TableSnapshot,
};

use crate::support::{test_config, Harness, PATIENCE};

fn plan_turn(snapshot: TableSnapshot, me: &str) -> Vec<PlayerDecision> {
    let mut table = Table::from_snapshot(snapshot).expect("valid snapshot");
    let mut decisions = Vec::new();
    while !table.turn_complete() && table.winner().is_none() {
        let decision = GreedyBot.decide(&table, me).expect("bot decision");
        table.eval_decision(me, &decision).expect("legal decision");
        decisions.push(decision);
    }
    decisions
}

fn submission(player: &str, counter: u64, decisions: Vec<PlayerDecision>) -> PlayerDecisions {
    PlayerDecisions {
        deciding_player: player.to_string(),
        decision_counter: counter,
        decisions,
    }
}

/// Wait until the session accepts decisions for round `counter`.
async fn wait_for_round(h: &Harness, counter: u64) -> String {
    tokio::time::timeout(PATIENCE, async {
        loop {
            let status = h.coordinator.status();
            if status.state.accepts_decisions() && status.decision_counter == counter {
                return status.chosen_player.expect("chosen player");
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("round started")
}

fn other(chosen: &str) -> &'static str {
    if chosen == "ana" {
        "bo"
    } else {
        "ana"
    }
}

async fn two_ackers() -> Harness {
    let mut h = Harness::new(test_config());
    h.seat_acker("ana");
    h.seat_acker("bo");
    h.ready("ana").await.expect("deal");
    h
}

#[tokio::test(start_paused = true)]
async fn decisions_before_the_turn_starts_are_retryable() {
    let h = two_ackers().await;
    assert_eq!(h.coordinator.state(), SessionState::ReadyToServeCards);

    let err = h
        .coordinator
        .submit_decisions(submission("ana", 0, vec![PlayerDecision::pull_from_deck()]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProtocolState);
    assert!(err.is_retryable());
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn wrong_player_and_stale_counter_are_rejected() {
    let h = two_ackers().await;
    let chosen = wait_for_round(&h, 0).await;

    let err = h
        .coordinator
        .submit_decisions(submission(other(&chosen), 0, vec![PlayerDecision::pull_from_deck()]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);
    assert!(!err.is_retryable());

    let err = h
        .coordinator
        .submit_decisions(submission(&chosen, 1, vec![PlayerDecision::pull_from_deck()]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::StaleDecisionCounter);
    assert!(!err.is_retryable());

    let err = h
        .coordinator
        .submit_decisions(submission("mallory", 0, Vec::new()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownIdentity);

    // Nothing changed.
    assert_eq!(h.coordinator.status().decision_counter, 0);
    assert!(h.coordinator.state().accepts_decisions());
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_batches_report_eligible_decisions() {
    let h = two_ackers().await;
    let chosen = wait_for_round(&h, 0).await;
    let before = h.coordinator.snapshot();

    let err = h
        .coordinator
        .submit_decisions(submission(&chosen, 0, Vec::new()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::IncompleteTurn);
    assert!(!err.eligible().is_empty());

    let seat = before.roster.iter().position(|p| *p == chosen).unwrap();
    let foreign = Deck::full()
        .iter()
        .copied()
        .find(|card| !before.hands[seat].contains(*card))
        .expect("some card is elsewhere");
    let err = h
        .coordinator
        .submit_decisions(submission(&chosen, 0, vec![PlayerDecision::play(foreign)]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CardNotInHand);
    assert!(!err.eligible().is_empty());

    assert_eq!(h.coordinator.snapshot(), before, "rejections leave the table untouched");
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn accepted_turn_syncs_and_advances_the_counter() {
    let h = two_ackers().await;
    let chosen = wait_for_round(&h, 0).await;

    let decisions = plan_turn(h.coordinator.snapshot(), &chosen);
    let outcomes = h
        .coordinator
        .submit_decisions(submission(&chosen, 0, decisions.clone()))
        .expect("turn accepted");
    assert_eq!(outcomes.len(), decisions.len());
    assert_eq!(h.coordinator.state(), SessionState::SyncingPlayerDecision);
    assert!(h
        .coordinator
        .pending_ack_ids()
        .iter()
        .any(|id| id.starts_with(&format!("decision-sync:{chosen}>"))));

    // A second copy of the same batch is refused while syncing.
    let err = h
        .coordinator
        .submit_decisions(submission(&chosen, 0, decisions))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProtocolState);

    if h.coordinator.snapshot().winner.is_some() {
        h.wait_for(SessionState::HaveWinner).await;
        h.shutdown().await;
        return;
    }

    let next = wait_for_round(&h, 1).await;
    let err = h
        .coordinator
        .submit_decisions(submission(&next, 0, vec![PlayerDecision::pull_from_deck()]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::StaleDecisionCounter);
    h.shutdown().await;
}
