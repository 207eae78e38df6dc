//! Deterministic bot: plays whenever it can, draws otherwise.

use super::decision_maker::{DecisionError, DecisionMaker};
use crate::domain::{dominant_color, DecisionKind, PlayerDecision, Table};

/// Plays the first legal non-wild card (wilds only as a last resort),
/// names its most common color, never challenges.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyBot;

impl GreedyBot {
    pub const NAME: &'static str = "greedy";
}

impl DecisionMaker for GreedyBot {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn decide(&self, table: &Table, me: &str) -> Result<PlayerDecision, DecisionError> {
        let kinds = table.eligible_decisions(me);
        if kinds.is_empty() {
            return Err(DecisionError::NotMyDecision(me.to_string()));
        }

        if kinds.contains(&DecisionKind::WildColorChoice) {
            let hand = table.hand(me).map(|h| h.as_slice()).unwrap_or_default();
            return Ok(PlayerDecision::choose_color(dominant_color(hand)));
        }
        if kinds.contains(&DecisionKind::NoChallenge) {
            return Ok(PlayerDecision::no_challenge());
        }
        if kinds.contains(&DecisionKind::PlayHandCard) {
            let playable = table.playable_cards(me);
            let card = playable
                .iter()
                .find(|c| !c.is_wild())
                .or_else(|| playable.first())
                .copied()
                .ok_or_else(|| DecisionError::InvalidMove("No playable card".into()))?;
            return Ok(PlayerDecision::play(card));
        }
        if kinds.contains(&DecisionKind::PullFromDeck) {
            return Ok(PlayerDecision::pull_from_deck());
        }
        if kinds.contains(&DecisionKind::PullFromPile) {
            return Ok(PlayerDecision::pull_from_pile());
        }
        Ok(PlayerDecision::pass())
    }
}
