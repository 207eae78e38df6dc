//! Rule-engine tests on hand-built tables.

use crate::domain::{
    table_rng, Card, CardLocation, Color, DecisionKind, Direction, PendingEffect, PlayerDecision,
    Rank, Table, TableEvent, TurnPhase, DECK_SIZE,
};
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};

fn c(rank: Rank, color: Color) -> Card {
    Card::new(rank, color)
}

fn kind_of(err: &DomainError) -> Option<&ValidationKind> {
    err.validation_kind()
}

fn assert_validation(result: Result<impl std::fmt::Debug, DomainError>, expected: ValidationKind) {
    match result {
        Err(DomainError::Validation(kind, _)) => assert_eq!(kind, expected),
        other => panic!("expected {expected:?}, got {other:?}"),
    }
}

#[test]
fn duplicate_player_is_rejected() {
    let mut table = Table::new();
    table.add_player("a").unwrap();
    table.add_player("b").unwrap();
    let err = table.add_player("a").unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ConflictKind::DuplicatePlayer, _)));
    assert_eq!(table.players(), ["a", "b"]);
}

#[test]
fn empty_name_is_rejected() {
    let mut table = Table::new();
    assert_validation(table.add_player("  "), ValidationKind::InvalidPlayerName);
}

#[test]
fn deal_seven_to_two_players() {
    let mut table = Table::new();
    table.add_player("a").unwrap();
    table.add_player("b").unwrap();
    let before = table.draw_pile().len();

    let events = table
        .shuffle_and_distribute(7, "a", false, &mut table_rng(Some(1)))
        .unwrap();

    assert_eq!(table.hand("a").unwrap().len(), 7);
    assert_eq!(table.hand("b").unwrap().len(), 7);
    assert_eq!(table.draw_pile().len(), before - 15);
    assert_eq!(table.discard_pile().len(), 1);
    assert_eq!(table.card_count(), DECK_SIZE);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, TableEvent::CardTransfer(t) if t.sink == CardLocation::Hand))
            .count(),
        14
    );
    assert!(table.required_color().is_some_and(|c| !c.is_wild()));
}

#[test]
fn deal_picks_first_player_relative_to_shuffler() {
    let mut table = Table::new();
    for p in ["a", "b", "c"] {
        table.add_player(p).unwrap();
    }
    let mut first = table.clone();
    first
        .shuffle_and_distribute(3, "b", true, &mut table_rng(Some(5)))
        .unwrap();
    assert_eq!(first.player_of_next_turn(), Some("b"));

    table
        .shuffle_and_distribute(3, "b", false, &mut table_rng(Some(5)))
        .unwrap();
    let expected = match table.direction() {
        Direction::Clockwise => "c",
        Direction::CounterClockwise => "a",
    };
    assert_eq!(table.player_of_next_turn(), Some(expected));
}

#[test]
fn deal_validates_hand_size_and_players() {
    let mut solo = Table::new();
    solo.add_player("a").unwrap();
    assert_validation(
        solo.shuffle_and_distribute(7, "a", false, &mut table_rng(Some(1))),
        ValidationKind::NotEnoughPlayers,
    );

    let mut table = Table::new();
    for i in 0..9 {
        table.add_player(&format!("p{i}")).unwrap();
    }
    for bad in [0, 13] {
        assert_validation(
            table.shuffle_and_distribute(bad, "p0", false, &mut table_rng(Some(1))),
            ValidationKind::InvalidHandSize,
        );
    }
    // 9 * 12 + 1 > 108
    assert_validation(
        table.shuffle_and_distribute(12, "p0", false, &mut table_rng(Some(1))),
        ValidationKind::InvalidHandSize,
    );
    assert!(!table.is_shuffled());
    assert_eq!(table.draw_pile().len(), DECK_SIZE);
}

#[test]
fn second_deal_is_a_no_op() {
    let mut table = Table::new();
    table.add_player("a").unwrap();
    table.add_player("b").unwrap();
    table
        .shuffle_and_distribute(5, "a", false, &mut table_rng(Some(3)))
        .unwrap();
    let before = table.clone();

    let events = table
        .shuffle_and_distribute(5, "b", true, &mut table_rng(Some(4)))
        .unwrap();
    assert!(events.is_empty());
    assert_eq!(table, before);

    let err = table.add_player("c").unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ConflictKind::AlreadyShuffled, _)));
}

#[test]
fn rank_match_beats_required_color_mismatch() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![
            vec![c(Rank::Five, Color::Red), c(Rank::One, Color::Blue)],
            vec![c(Rank::Two, Color::Yellow)],
        ],
        vec![c(Rank::Five, Color::Green)],
        Color::Blue,
    );
    assert_eq!(table.begin_turn().unwrap(), "a");

    let outcome = table
        .eval_decision("a", &PlayerDecision::play(c(Rank::Five, Color::Red)))
        .unwrap();

    assert!(outcome.turn_complete);
    assert_eq!(table.discard_top(), Some(c(Rank::Five, Color::Red)));
    assert_eq!(table.required_color(), Some(Color::Red));
    assert_eq!(table.player_of_next_turn(), Some("b"));
    assert_eq!(table.current_player(), None);
}

#[test]
fn illegal_play_is_rejected_without_mutation() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![vec![c(Rank::Seven, Color::Red), c(Rank::One, Color::Red)], vec![c(Rank::Two, Color::Yellow)]],
        vec![c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();
    let before = table.clone();

    assert_validation(
        table.eval_decision("a", &PlayerDecision::play(c(Rank::Seven, Color::Red))),
        ValidationKind::IllegalPlay,
    );
    assert_validation(
        table.eval_decision("a", &PlayerDecision::play(c(Rank::Seven, Color::Blue))),
        ValidationKind::CardNotInHand,
    );
    assert_validation(
        table.eval_decision(
            "a",
            &PlayerDecision {
                kind: DecisionKind::PlayHandCard,
                card: None,
                color: None,
            },
        ),
        ValidationKind::MissingCard,
    );
    assert_validation(
        table.eval_decision("b", &PlayerDecision::pull_from_deck()),
        ValidationKind::OutOfTurn,
    );
    assert_eq!(table, before);
}

#[test]
fn second_draw_in_a_turn_fails() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![vec![c(Rank::One, Color::Red)], vec![c(Rank::Two, Color::Red)]],
        vec![c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();

    table
        .eval_decision("a", &PlayerDecision::pull_from_deck())
        .unwrap();
    assert_eq!(table.phase(), TurnPhase::CardDrawn);
    assert_validation(
        table.eval_decision("a", &PlayerDecision::pull_from_deck()),
        ValidationKind::AlreadyDrewCard,
    );
    assert_validation(
        table.eval_decision("a", &PlayerDecision::pull_from_pile()),
        ValidationKind::AlreadyDrewCard,
    );
    assert_eq!(table.hand("a").unwrap().len(), 2);
}

#[test]
fn playing_the_last_card_wins() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![vec![c(Rank::Five, Color::Red)], vec![c(Rank::Two, Color::Blue)]],
        vec![c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();

    let outcome = table
        .eval_decision("a", &PlayerDecision::play(c(Rank::Five, Color::Red)))
        .unwrap();

    assert!(table.hand("a").unwrap().is_empty());
    assert_eq!(table.winner(), Some("a"));
    assert_eq!(outcome.winner.as_deref(), Some("a"));
    assert!(outcome
        .events
        .contains(&TableEvent::PlayerWon { player: "a".into() }));
    assert_validation(table.begin_turn(), ValidationKind::GameOver);
    assert_validation(
        table.eval_decision("b", &PlayerDecision::pull_from_deck()),
        ValidationKind::GameOver,
    );
}

#[test]
fn pass_requires_a_draw_first() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![vec![c(Rank::One, Color::Blue)], vec![c(Rank::Two, Color::Blue)]],
        vec![c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();
    assert_eq!(
        table.eligible_decisions("a"),
        vec![DecisionKind::PullFromDeck]
    );
    assert_validation(
        table.eval_decision("a", &PlayerDecision::pass()),
        ValidationKind::MustDrawFirst,
    );

    table
        .eval_decision("a", &PlayerDecision::pull_from_deck())
        .unwrap();
    assert!(table.eligible_decisions("a").contains(&DecisionKind::Pass));
    let outcome = table.eval_decision("a", &PlayerDecision::pass()).unwrap();
    assert!(outcome.turn_complete);
    assert_eq!(table.player_of_next_turn(), Some("b"));
    assert_eq!(table.phase(), TurnPhase::Start);
}

#[test]
fn pile_pull_keeps_the_active_card() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![vec![c(Rank::One, Color::Blue)], vec![c(Rank::Two, Color::Blue)]],
        vec![c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();
    assert_validation(
        table.eval_decision("a", &PlayerDecision::pull_from_pile()),
        ValidationKind::PileEmpty,
    );

    let mut table = Table::rigged(
        &["a", "b"],
        vec![vec![c(Rank::One, Color::Blue)], vec![c(Rank::Two, Color::Blue)]],
        vec![c(Rank::Three, Color::Yellow), c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();
    table
        .eval_decision("a", &PlayerDecision::pull_from_pile())
        .unwrap();
    assert!(table.hand("a").unwrap().contains(c(Rank::Five, Color::Green)));
    assert_eq!(table.discard_top(), Some(c(Rank::Three, Color::Yellow)));
    assert_eq!(table.required_color(), Some(Color::Yellow));
}

#[test]
fn skip_jumps_one_seat() {
    let mut table = Table::rigged(
        &["a", "b", "c"],
        vec![
            vec![c(Rank::Skip, Color::Red), c(Rank::One, Color::Red)],
            vec![c(Rank::Two, Color::Blue)],
            vec![c(Rank::Three, Color::Blue)],
        ],
        vec![c(Rank::Five, Color::Red)],
        Color::Red,
    );
    table.begin_turn().unwrap();
    let outcome = table
        .eval_decision("a", &PlayerDecision::play(c(Rank::Skip, Color::Red)))
        .unwrap();
    assert!(outcome
        .events
        .contains(&TableEvent::TurnSkipped { player: "b".into() }));
    assert_eq!(table.player_of_next_turn(), Some("c"));
}

#[test]
fn reverse_flips_direction() {
    let mut table = Table::rigged(
        &["a", "b", "c"],
        vec![
            vec![c(Rank::Reverse, Color::Red), c(Rank::One, Color::Red)],
            vec![c(Rank::Two, Color::Blue)],
            vec![c(Rank::Three, Color::Blue)],
        ],
        vec![c(Rank::Five, Color::Red)],
        Color::Red,
    );
    table.begin_turn().unwrap();
    table
        .eval_decision("a", &PlayerDecision::play(c(Rank::Reverse, Color::Red)))
        .unwrap();
    assert_eq!(table.direction(), Direction::CounterClockwise);
    assert_eq!(table.player_of_next_turn(), Some("c"));
}

#[test]
fn draw_two_penalizes_and_skips_the_next_seat() {
    let mut table = Table::rigged(
        &["a", "b", "c"],
        vec![
            vec![c(Rank::DrawTwo, Color::Red), c(Rank::One, Color::Red)],
            vec![c(Rank::Two, Color::Blue)],
            vec![c(Rank::Three, Color::Blue)],
        ],
        vec![c(Rank::Five, Color::Red)],
        Color::Red,
    );
    table.begin_turn().unwrap();
    table
        .eval_decision("a", &PlayerDecision::play(c(Rank::DrawTwo, Color::Red)))
        .unwrap();
    assert_eq!(table.hand("b").unwrap().len(), 3);
    assert_eq!(table.player_of_next_turn(), Some("c"));
    assert_eq!(table.card_count(), DECK_SIZE);
}

#[test]
fn wild_needs_a_color_before_the_turn_ends() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![
            vec![Card::wild(), c(Rank::One, Color::Red)],
            vec![c(Rank::Two, Color::Blue)],
        ],
        vec![c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();
    let outcome = table
        .eval_decision("a", &PlayerDecision::play(Card::wild()))
        .unwrap();
    assert!(!outcome.turn_complete);
    assert_eq!(table.phase(), TurnPhase::CardPlayed);
    assert_eq!(
        table.eligible_decisions("a"),
        vec![DecisionKind::WildColorChoice]
    );
    assert_validation(
        table.eval_decision("a", &PlayerDecision::pass()),
        ValidationKind::UnexpectedDecision,
    );
    assert_validation(
        table.eval_decision("a", &PlayerDecision::choose_color(Color::Wild)),
        ValidationKind::IllegalColor,
    );

    let outcome = table
        .eval_decision("a", &PlayerDecision::choose_color(Color::Blue))
        .unwrap();
    assert!(outcome.turn_complete);
    assert_eq!(table.required_color(), Some(Color::Blue));
    assert_eq!(table.pending(), None);
    assert_eq!(table.player_of_next_turn(), Some("b"));
}

fn draw_four_table(offender_hand: Vec<Card>) -> Table {
    let mut table = Table::rigged(
        &["a", "b", "c"],
        vec![
            offender_hand,
            vec![c(Rank::Two, Color::Blue)],
            vec![c(Rank::Three, Color::Blue)],
        ],
        vec![c(Rank::Three, Color::Red)],
        Color::Red,
    );
    table.begin_turn().unwrap();
    table
        .eval_turn(
            "a",
            &[
                PlayerDecision::play(Card::wild_draw_four()),
                PlayerDecision::choose_color(Color::Green),
            ],
        )
        .unwrap();
    assert!(table.awaiting_challenge());
    assert_eq!(table.begin_turn().unwrap(), "b");
    assert_eq!(
        table.eligible_decisions("b"),
        vec![DecisionKind::Challenge, DecisionKind::NoChallenge]
    );
    table
}

#[test]
fn accepting_draw_four_draws_and_skips() {
    let mut table = draw_four_table(vec![Card::wild_draw_four(), c(Rank::Nine, Color::Blue)]);
    assert_validation(
        table.eval_decision("b", &PlayerDecision::pull_from_deck()),
        ValidationKind::UnexpectedDecision,
    );
    let outcome = table
        .eval_decision("b", &PlayerDecision::no_challenge())
        .unwrap();
    assert!(outcome.turn_complete);
    assert_eq!(table.hand("b").unwrap().len(), 5);
    assert_eq!(table.player_of_next_turn(), Some("c"));
}

#[test]
fn upheld_challenge_penalizes_the_offender() {
    let mut table = draw_four_table(vec![
        Card::wild_draw_four(),
        c(Rank::Nine, Color::Red),
        c(Rank::One, Color::Blue),
    ]);
    let outcome = table.eval_decision("b", &PlayerDecision::challenge()).unwrap();

    assert!(!outcome.turn_complete);
    assert_eq!(table.hand("a").unwrap().len(), 2 + 6);
    assert_eq!(table.hand("b").unwrap().len(), 1);
    assert_eq!(table.current_player(), Some("b"));
    assert!(outcome.events.contains(&TableEvent::ChallengeResolved {
        challenger: "b".into(),
        offender: "a".into(),
        upheld: true,
        penalized: "a".into(),
    }));
    assert!(table.eligible_decisions("b").contains(&DecisionKind::PullFromDeck));
}

#[test]
fn failed_challenge_penalizes_the_challenger() {
    let mut table = draw_four_table(vec![Card::wild_draw_four(), c(Rank::Nine, Color::Blue)]);
    let outcome = table.eval_decision("b", &PlayerDecision::challenge()).unwrap();

    assert!(outcome.turn_complete);
    assert_eq!(table.hand("a").unwrap().len(), 1);
    assert_eq!(table.hand("b").unwrap().len(), 1 + 6);
    assert_eq!(table.player_of_next_turn(), Some("c"));
}

#[test]
fn incomplete_batch_is_rejected_atomically() {
    let mut table = Table::rigged(
        &["a", "b"],
        vec![vec![Card::wild(), c(Rank::One, Color::Red)], vec![c(Rank::Two, Color::Blue)]],
        vec![c(Rank::Five, Color::Green)],
        Color::Green,
    );
    table.begin_turn().unwrap();
    let before = table.clone();

    let err = table
        .eval_turn("a", &[PlayerDecision::play(Card::wild())])
        .unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::IncompleteTurn));
    assert_eq!(table, before);

    let err = table
        .eval_turn(
            "a",
            &[PlayerDecision::play(Card::wild()), PlayerDecision::pass()],
        )
        .unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::UnexpectedDecision));
    assert_eq!(table, before);

    assert_validation(table.eval_turn("a", &[]), ValidationKind::IncompleteTurn);
}

#[test]
fn penalty_draw_stops_when_the_deck_runs_out() {
    let table = Table::rigged(
        &["a", "b"],
        vec![vec![c(Rank::DrawTwo, Color::Red), c(Rank::One, Color::Red)], vec![c(Rank::Two, Color::Blue)]],
        vec![c(Rank::Five, Color::Red)],
        Color::Red,
    );
    // Bury all but one draw card beneath the discard top.
    let mut snap = table.snapshot();
    let mut rest = snap.draw.as_slice().to_vec();
    let keep = rest.split_off(rest.len() - 1);
    rest.extend(snap.discard.iter().copied());
    snap.draw = crate::domain::Deck::from_cards(keep);
    snap.discard = crate::domain::Deck::from_cards(rest);
    let mut table = Table::from_snapshot(snap).unwrap();

    table.begin_turn().unwrap();
    table
        .eval_decision("a", &PlayerDecision::play(c(Rank::DrawTwo, Color::Red)))
        .unwrap();
    assert_eq!(table.hand("b").unwrap().len(), 2);
    assert!(table.draw_pile().is_empty());
    assert_eq!(table.card_count(), DECK_SIZE);
}

#[test]
fn snapshot_restores_an_identical_table() {
    let mut table = Table::new();
    for p in ["a", "b", "c"] {
        table.add_player(p).unwrap();
    }
    table
        .shuffle_and_distribute(7, "a", false, &mut table_rng(Some(11)))
        .unwrap();

    let json = serde_json::to_string(&table.snapshot()).unwrap();
    let restored = Table::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();
    assert_eq!(restored, table);
}

#[test]
fn tampered_snapshot_is_rejected() {
    let mut table = Table::new();
    table.add_player("a").unwrap();
    table.add_player("b").unwrap();
    table
        .shuffle_and_distribute(7, "a", false, &mut table_rng(Some(11)))
        .unwrap();

    let mut lost_card = table.snapshot();
    let mut draw = lost_card.draw.clone();
    draw.pop();
    lost_card.draw = draw;
    assert_validation(Table::from_snapshot(lost_card), ValidationKind::SnapshotInvalid);

    let mut bad_seat = table.snapshot();
    bad_seat.next_turn = 5;
    assert_validation(Table::from_snapshot(bad_seat), ValidationKind::SnapshotInvalid);

    let mut duplicate = table.snapshot();
    duplicate.roster[1] = "a".into();
    assert_validation(Table::from_snapshot(duplicate), ValidationKind::SnapshotInvalid);
}

#[test]
fn pending_effect_serializes_with_a_tag() {
    let pending = PendingEffect::Challenge {
        challenger: 1,
        offender: 0,
        had_alternative: false,
    };
    let json = serde_json::to_value(pending).unwrap();
    assert_eq!(json["type"], "challenge");
}
