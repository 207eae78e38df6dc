// Proptest generators and game drivers for domain tests.
// Tables are reached by playing legal decisions from a seeded deal, so every
// generated state is one a real session can produce.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::{
    Card, Color, DecisionKind, PlayerDecision, Rank, Table, MAX_HAND_SIZE, MIN_PLAYERS,
};

pub const PLAYER_NAMES: [&str; 6] = ["ana", "bo", "cy", "dee", "eli", "fay"];

/// Generate a random printed or wild Color
pub fn color() -> impl Strategy<Value = Color> {
    prop_oneof![
        Just(Color::Red),
        Just(Color::Green),
        Just(Color::Blue),
        Just(Color::Yellow),
        Just(Color::Wild),
    ]
}

/// Generate a card that exists in the deck
pub fn card() -> impl Strategy<Value = Card> {
    let printed = (0u8..13, 0usize..4).prop_map(|(r, c)| {
        let rank = Rank::digit(r).unwrap_or_else(|| Rank::ACTIONS[(r - 10) as usize]);
        Card::new(rank, Color::PLAYABLE[c])
    });
    prop_oneof![
        8 => printed,
        1 => Just(Card::wild()),
        1 => Just(Card::wild_draw_four()),
    ]
}

pub fn decision_kind() -> impl Strategy<Value = DecisionKind> {
    prop_oneof![
        Just(DecisionKind::PullFromDeck),
        Just(DecisionKind::PullFromPile),
        Just(DecisionKind::PlayHandCard),
        Just(DecisionKind::WildColorChoice),
        Just(DecisionKind::Challenge),
        Just(DecisionKind::NoChallenge),
        Just(DecisionKind::Pass),
    ]
}

/// Any decision, legal or not, with arbitrary payloads.
pub fn any_decision() -> impl Strategy<Value = PlayerDecision> {
    (decision_kind(), proptest::option::of(card()), proptest::option::of(color())).prop_map(
        |(kind, card, color)| PlayerDecision { kind, card, color },
    )
}

/// (players, hand_size) pairs that fit in one deck.
pub fn table_shape() -> impl Strategy<Value = (usize, u8)> {
    (MIN_PLAYERS..=PLAYER_NAMES.len()).prop_flat_map(|players| {
        let max_hand = ((107 / players) as u8).min(MAX_HAND_SIZE);
        (Just(players), 1..=max_hand)
    })
}

/// A freshly dealt table. The first seated player shuffles.
pub fn dealt_table(players: usize, hand_size: u8, seed: u64) -> Table {
    let mut table = Table::new();
    for name in &PLAYER_NAMES[..players] {
        table.add_player(name).unwrap();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    table
        .shuffle_and_distribute(hand_size, PLAYER_NAMES[0], false, &mut rng)
        .unwrap();
    table
}

/// Pick one legal decision for `player` at random.
pub fn random_legal_decision<R: Rng>(table: &Table, player: &str, rng: &mut R) -> PlayerDecision {
    let kinds = table.eligible_decisions(player);
    assert!(!kinds.is_empty(), "{player} has nothing to decide");
    match kinds[rng.random_range(0..kinds.len())] {
        DecisionKind::PullFromDeck => PlayerDecision::pull_from_deck(),
        DecisionKind::PullFromPile => PlayerDecision::pull_from_pile(),
        DecisionKind::PlayHandCard => {
            let playable = table.playable_cards(player);
            PlayerDecision::play(playable[rng.random_range(0..playable.len())])
        }
        DecisionKind::WildColorChoice => {
            PlayerDecision::choose_color(Color::PLAYABLE[rng.random_range(0..4)])
        }
        DecisionKind::Challenge => PlayerDecision::challenge(),
        DecisionKind::NoChallenge => PlayerDecision::no_challenge(),
        DecisionKind::Pass => PlayerDecision::pass(),
    }
}

/// Play `decisions` random legal decisions from a dealt table, beginning
/// turns as needed. Calls `observe` after every applied decision.
pub fn play_random<F>(table: &mut Table, decisions: usize, seed: u64, mut observe: F)
where
    F: FnMut(&Table, &str, &PlayerDecision),
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..decisions {
        if table.winner().is_some() {
            return;
        }
        if table.turn_complete() {
            table.begin_turn().unwrap();
        }
        let actor = actor(table);
        let decision = random_legal_decision(table, &actor, &mut rng);
        table.eval_decision(&actor, &decision).unwrap();
        observe(table, &actor, &decision);
    }
}

/// The player whose decision the table is waiting on.
pub fn actor(table: &Table) -> String {
    table
        .players()
        .iter()
        .find(|p| !table.eligible_decisions(p).is_empty())
        .cloned()
        .expect("someone must be able to act mid-turn")
}
