use std::time::Duration;

use uno_coordinator::{SessionConfig, SessionState};

use crate::support::{test_config, Harness, PATIENCE};

const MAX_TURNS: u64 = 400;

fn debug_config() -> SessionConfig {
    SessionConfig {
        debug_mode: true,
        seed: Some(11),
        ..test_config()
    }
}

/// Release one turn and wait until it has been synced everywhere.
async fn step(h: &Harness) -> SessionState {
    let mut states = h.coordinator.subscribe();
    states.borrow_and_update();
    h.coordinator.advance();
    tokio::time::timeout(PATIENCE, async {
        loop {
            states.changed().await.expect("session open");
            let state = *states.borrow_and_update();
            if matches!(
                state,
                SessionState::DoneSyncingPlayerDecision | SessionState::HaveWinner
            ) {
                return state;
            }
        }
    })
    .await
    .expect("turn finished")
}

#[tokio::test(start_paused = true)]
async fn debug_mode_waits_for_advance() {
    let mut h = Harness::new(debug_config());
    h.seat_bots(&["ana", "bo"]);
    h.ready("ana").await.unwrap();
    h.wait_for(SessionState::CardsServed).await;

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(h.coordinator.state(), SessionState::CardsServed);
    assert!(h.coordinator.status().chosen_player.is_none());

    let state = step(&h).await;
    let status = h.coordinator.status();
    assert_eq!(status.decision_counter, 1);
    if state == SessionState::DoneSyncingPlayerDecision {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(h.coordinator.state(), SessionState::DoneSyncingPlayerDecision);
    }
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn replicas_track_the_authoritative_table_every_turn() {
    let mut h = Harness::new(debug_config());
    h.seat_bots(&["ana", "bo", "cy"]);
    h.ready("cy").await.unwrap();
    h.wait_for(SessionState::CardsServed).await;

    let dealt = h.coordinator.snapshot();
    for replica in &h.replicas {
        assert_eq!(replica.snapshot(), dealt, "{} after the deal", replica.name());
    }

    let mut state = SessionState::CardsServed;
    for turn in 1..=MAX_TURNS {
        state = step(&h).await;
        let status = h.coordinator.status();
        assert_eq!(status.decision_counter, turn);
        assert!(status.last_barrier.as_ref().is_some_and(|r| r.is_complete()));

        let authoritative = h.coordinator.snapshot();
        assert_eq!(authoritative.card_count(), 108);
        for replica in &h.replicas {
            assert_eq!(replica.snapshot(), authoritative, "{} after turn {turn}", replica.name());
        }
        if state == SessionState::HaveWinner {
            break;
        }
    }

    if state == SessionState::HaveWinner {
        let status = h.coordinator.status();
        let winner = status.winner.expect("winner recorded");
        let snapshot = h.coordinator.snapshot();
        let seat = snapshot.roster.iter().position(|p| *p == winner).unwrap();
        assert!(snapshot.hands[seat].is_empty());

        // No further turns once the game is won.
        h.coordinator.advance();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.coordinator.state(), SessionState::HaveWinner);
    }
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn paced_game_runs_without_operator() {
    let mut h = Harness::new(test_config());
    h.seat_bots(&["ana", "bo"]);
    h.ready("ana").await.unwrap();

    tokio::time::timeout(PATIENCE, async {
        while h.coordinator.status().decision_counter < 3
            && h.coordinator.state() != SessionState::HaveWinner
        {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("turns advance on their own");
    h.shutdown().await;
}
