//! Random bot: uniformly random legal decisions, seedable for tests.

use parking_lot::Mutex;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::decision_maker::{DecisionError, DecisionMaker};
use crate::domain::{table_rng, Color, DecisionKind, PlayerDecision, Table};

pub struct RandomBot {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomBot {
    pub const NAME: &'static str = "random";

    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Mutex::new(table_rng(seed)),
        }
    }
}

impl DecisionMaker for RandomBot {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn decide(&self, table: &Table, me: &str) -> Result<PlayerDecision, DecisionError> {
        let kinds = table.eligible_decisions(me);
        if kinds.is_empty() {
            return Err(DecisionError::NotMyDecision(me.to_string()));
        }

        let mut rng = self.rng.lock();
        let decision = match kinds[rng.random_range(0..kinds.len())] {
            DecisionKind::PullFromDeck => PlayerDecision::pull_from_deck(),
            DecisionKind::PullFromPile => PlayerDecision::pull_from_pile(),
            DecisionKind::PlayHandCard => {
                let playable = table.playable_cards(me);
                if playable.is_empty() {
                    return Err(DecisionError::InvalidMove("No playable card".into()));
                }
                PlayerDecision::play(playable[rng.random_range(0..playable.len())])
            }
            DecisionKind::WildColorChoice => {
                PlayerDecision::choose_color(Color::PLAYABLE[rng.random_range(0..Color::PLAYABLE.len())])
            }
            DecisionKind::Challenge => PlayerDecision::challenge(),
            DecisionKind::NoChallenge => PlayerDecision::no_challenge(),
            DecisionKind::Pass => PlayerDecision::pass(),
        };
        Ok(decision)
    }
}
