//! Bots the simulator can seat, by name.

use super::decision_maker::DecisionMaker;
use super::greedy::GreedyBot;
use super::random::RandomBot;

pub struct BotFactory {
    pub name: &'static str,
    pub make: fn(Option<u64>) -> Box<dyn DecisionMaker>,
}

static REGISTRY: &[BotFactory] = &[
    BotFactory {
        name: GreedyBot::NAME,
        make: |_seed| Box::new(GreedyBot),
    },
    BotFactory {
        name: RandomBot::NAME,
        make: |seed| Box::new(RandomBot::new(seed)),
    },
];

pub fn registered_bots() -> &'static [BotFactory] {
    REGISTRY
}

pub fn by_name(name: &str) -> Option<&'static BotFactory> {
    REGISTRY.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}
