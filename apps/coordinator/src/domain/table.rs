//! The table: canonical game state and validate-then-mutate rule enforcement.
//!
//! Every public mutator checks the whole decision before touching state, so
//! a rejected call leaves the table exactly as it was. Replicas run the same
//! code against the same inputs and therefore stay identical to the
//! coordinator without ever receiving state after the initial deal.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cards_logic::{has_playable_besides, is_playable};
use super::cards_types::{Card, Color, Rank};
use super::deck::{Deck, DECK_SIZE};
use super::decision::{DecisionKind, PlayerDecision};
use super::events::{CardLocation, CardTransfer, TableEvent};
use super::snapshot::TableSnapshot;
use super::turn::{next_seat, nth_seat, Direction, Seat, TurnPhase};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};

pub const MIN_HAND_SIZE: u8 = 1;
pub const MAX_HAND_SIZE: u8 = 12;
pub const MIN_PLAYERS: usize = 2;

/// Required color when the starter card is wild. Nobody is asked to choose.
pub const WILD_STARTER_COLOR: Color = Color::Red;

const DRAW_TWO_PENALTY: usize = 2;
const DRAW_FOUR_PENALTY: usize = 4;
const CHALLENGE_PENALTY: usize = 6;

/// A special-card effect that still needs a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingEffect {
    /// `player` put down a wild card and must choose its color.
    ColorChoice {
        player: Seat,
        draw_four: bool,
        /// For a WildDrawFour: whether the player held another playable card.
        had_alternative: bool,
    },
    /// `challenger` must accept or challenge the WildDrawFour of `offender`.
    Challenge {
        challenger: Seat,
        offender: Seat,
        had_alternative: bool,
    },
}

/// Result of applying one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub decision: PlayerDecision,
    pub events: Vec<TableEvent>,
    /// Whether the deciding player's turn ended with this decision.
    pub turn_complete: bool,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    draw: Deck,
    discard: Deck,
    hands: Vec<Deck>,
    roster: Vec<String>,
    seats: HashMap<String, Seat>,
    direction: Direction,
    /// Color the next play must match. Follows the discard top, or the
    /// chosen color when the top is wild.
    required_color: Option<Color>,
    phase: TurnPhase,
    pending: Option<PendingEffect>,
    shuffler: Option<String>,
    /// Seat whose turn is in progress, if any.
    current: Option<Seat>,
    /// Seat that will be chosen when the next turn begins.
    next_turn: Seat,
    shuffled: bool,
    winner: Option<Seat>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// Full 108-card draw pile in standard order, empty discard, no players.
    pub fn new() -> Self {
        Self {
            draw: Deck::full(),
            discard: Deck::new(),
            hands: Vec::new(),
            roster: Vec::new(),
            seats: HashMap::new(),
            direction: Direction::Clockwise,
            required_color: None,
            phase: TurnPhase::Start,
            pending: None,
            shuffler: None,
            current: None,
            next_turn: 0,
            shuffled: false,
            winner: None,
        }
    }

    pub fn players(&self) -> &[String] {
        &self.roster
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    pub fn seat_of(&self, name: &str) -> Option<Seat> {
        self.seats.get(name).copied()
    }

    /// Name at `seat`. Panics on a seat that does not exist: callers only
    /// pass seats taken from the table itself.
    pub fn player_at(&self, seat: Seat) -> &str {
        &self.roster[seat]
    }

    pub fn hand(&self, name: &str) -> Option<&Deck> {
        self.seat_of(name).map(|seat| &self.hands[seat])
    }

    pub fn draw_pile(&self) -> &Deck {
        &self.draw
    }

    pub fn discard_pile(&self) -> &Deck {
        &self.discard
    }

    pub fn discard_top(&self) -> Option<Card> {
        self.discard.top()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn required_color(&self) -> Option<Color> {
        self.required_color
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn pending(&self) -> Option<PendingEffect> {
        self.pending
    }

    pub fn shuffler(&self) -> Option<&str> {
        self.shuffler.as_deref()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn current_player(&self) -> Option<&str> {
        self.current.map(|seat| self.player_at(seat))
    }

    pub fn player_of_next_turn(&self) -> Option<&str> {
        self.roster.get(self.next_turn).map(String::as_str)
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.map(|seat| self.player_at(seat))
    }

    /// Whether the chosen player of the next turn opens it by answering a
    /// WildDrawFour challenge.
    pub fn awaiting_challenge(&self) -> bool {
        matches!(self.pending, Some(PendingEffect::Challenge { .. }))
    }

    /// No turn in progress and no wild card waiting for its color.
    pub fn turn_complete(&self) -> bool {
        self.current.is_none() && !matches!(self.pending, Some(PendingEffect::ColorChoice { .. }))
    }

    /// Cards across draw pile, discard pile and all hands.
    pub fn card_count(&self) -> usize {
        self.draw.len() + self.discard.len() + self.hands.iter().map(Deck::len).sum::<usize>()
    }

    pub fn add_player(&mut self, name: &str) -> Result<Seat, DomainError> {
        if self.shuffled {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyShuffled,
                format!("Cannot add {name}: cards already dealt"),
            ));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation(
                ValidationKind::InvalidPlayerName,
                "Player name must not be empty",
            ));
        }
        if self.seats.contains_key(name) {
            return Err(DomainError::conflict(
                ConflictKind::DuplicatePlayer,
                format!("Player {name} already at the table"),
            ));
        }

        let seat = self.roster.len();
        self.roster.push(name.to_string());
        self.seats.insert(name.to_string(), seat);
        self.hands.push(Deck::new());
        debug!(player = name, seat, "Player added to table");
        Ok(seat)
    }

    /// Shuffle the draw pile, deal `hand_size` cards to every player and flip
    /// the starter card.
    ///
    /// The first turn goes to the seat after the shuffler (in the direction
    /// left by the starter), or to the shuffler when `shuffler_is_first`.
    /// Calling this again after a successful deal is a logged no-op.
    pub fn shuffle_and_distribute<R: Rng + ?Sized>(
        &mut self,
        hand_size: u8,
        shuffler: &str,
        shuffler_is_first: bool,
        rng: &mut R,
    ) -> Result<Vec<TableEvent>, DomainError> {
        if self.shuffled {
            info!(shuffler, "Cards already dealt; ignoring repeated shuffle");
            return Ok(Vec::new());
        }
        if !(MIN_HAND_SIZE..=MAX_HAND_SIZE).contains(&hand_size) {
            return Err(DomainError::validation(
                ValidationKind::InvalidHandSize,
                format!("Hand size must be {MIN_HAND_SIZE}..={MAX_HAND_SIZE}, got {hand_size}"),
            ));
        }
        let players = self.player_count();
        if players < MIN_PLAYERS {
            return Err(DomainError::validation(
                ValidationKind::NotEnoughPlayers,
                format!("Need at least {MIN_PLAYERS} players, have {players}"),
            ));
        }
        let needed = players * hand_size as usize + 1;
        if needed > DECK_SIZE {
            return Err(DomainError::validation(
                ValidationKind::InvalidHandSize,
                format!("Dealing {hand_size} to {players} players needs {needed} cards"),
            ));
        }
        let shuffler_seat = self.seat_of(shuffler).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Player, format!("Unknown shuffler {shuffler}"))
        })?;

        // Deal into scratch piles, then commit.
        let mut draw = self.draw.clone();
        draw.shuffle(rng);
        let mut hands = self.hands.clone();
        let mut events = Vec::with_capacity(needed + 2);
        for _ in 0..hand_size {
            for (seat, hand) in hands.iter_mut().enumerate() {
                let Some(card) = draw.pop() else {
                    return Err(DomainError::validation_other("Draw pile ran out while dealing"));
                };
                hand.push(card);
                events.push(TableEvent::CardTransfer(CardTransfer {
                    source: CardLocation::DrawPile,
                    sink: CardLocation::Hand,
                    player: self.roster[seat].clone(),
                    card,
                }));
            }
        }
        let Some(starter) = draw.pop() else {
            return Err(DomainError::validation_other("Draw pile ran out before the starter"));
        };

        let required = if starter.is_wild() {
            WILD_STARTER_COLOR
        } else {
            starter.color
        };
        let direction = if starter.rank == Rank::Reverse {
            self.direction.reversed()
        } else {
            self.direction
        };
        events.push(TableEvent::StarterFlipped {
            card: starter,
            required_color: required,
        });
        if direction != self.direction {
            events.push(TableEvent::DirectionChanged { direction });
        }

        self.draw = draw;
        self.hands = hands;
        self.discard.push(starter);
        self.required_color = Some(required);
        self.direction = direction;
        self.shuffler = Some(shuffler.to_string());
        self.next_turn = if shuffler_is_first {
            shuffler_seat
        } else {
            next_seat(shuffler_seat, direction, players)
        };
        self.current = None;
        self.phase = TurnPhase::Start;
        self.shuffled = true;

        info!(
            shuffler,
            hand_size,
            players,
            starter = %starter,
            first = self.player_at(self.next_turn),
            "Cards shuffled and dealt"
        );
        Ok(events)
    }

    /// Start the turn of the player-of-next-turn and return their name.
    pub fn begin_turn(&mut self) -> Result<String, DomainError> {
        self.require_live()?;
        if !self.turn_complete() {
            return Err(DomainError::validation(
                ValidationKind::TurnInProgress,
                "Previous turn has not finished",
            ));
        }
        self.current = Some(self.next_turn);
        self.phase = TurnPhase::Start;
        Ok(self.player_at(self.next_turn).to_string())
    }

    /// Decision kinds `player` may submit right now. Empty when it is not
    /// their decision.
    pub fn eligible_decisions(&self, player: &str) -> Vec<DecisionKind> {
        let Ok(seat) = self.require_actor(player) else {
            return Vec::new();
        };
        match self.pending {
            Some(PendingEffect::ColorChoice { .. }) => vec![DecisionKind::WildColorChoice],
            Some(PendingEffect::Challenge { .. }) => {
                vec![DecisionKind::Challenge, DecisionKind::NoChallenge]
            }
            None => {
                let mut kinds = Vec::new();
                if self.phase == TurnPhase::Start {
                    if self.can_pull_from_deck() {
                        kinds.push(DecisionKind::PullFromDeck);
                    }
                    if self.can_pull_from_pile() {
                        kinds.push(DecisionKind::PullFromPile);
                    }
                }
                if self.has_playable(seat) {
                    kinds.push(DecisionKind::PlayHandCard);
                }
                if self.may_pass() {
                    kinds.push(DecisionKind::Pass);
                }
                kinds
            }
        }
    }

    /// Cards in `player`'s hand that are legal to play right now.
    pub fn playable_cards(&self, player: &str) -> Vec<Card> {
        let (Some(hand), Some(top), Some(required)) =
            (self.hand(player), self.discard_top(), self.required_color)
        else {
            return Vec::new();
        };
        super::cards_logic::playable_cards(hand.as_slice(), top, required)
    }

    /// Apply exactly one decision from `player`.
    pub fn eval_decision(
        &mut self,
        player: &str,
        decision: &PlayerDecision,
    ) -> Result<DecisionOutcome, DomainError> {
        let seat = self.require_actor(player)?;
        let mut events = Vec::new();

        match decision.kind {
            DecisionKind::PullFromDeck => self.pull_from_deck(seat, &mut events)?,
            DecisionKind::PullFromPile => self.pull_from_pile(seat, &mut events)?,
            DecisionKind::PlayHandCard => self.play_hand_card(seat, decision.card, &mut events)?,
            DecisionKind::WildColorChoice => self.choose_color(seat, decision.color, &mut events)?,
            DecisionKind::Challenge => self.answer_challenge(seat, true, &mut events)?,
            DecisionKind::NoChallenge => self.answer_challenge(seat, false, &mut events)?,
            DecisionKind::Pass => self.pass(seat)?,
        }

        if self.winner.is_none() && self.hands[seat].is_empty() {
            self.winner = Some(seat);
            events.push(TableEvent::PlayerWon {
                player: player.to_string(),
            });
            info!(player, "Player emptied their hand");
        }
        debug_assert_eq!(self.card_count(), DECK_SIZE, "card conservation");

        Ok(DecisionOutcome {
            decision: *decision,
            events,
            turn_complete: self.turn_complete(),
            winner: self.winner().map(str::to_string),
        })
    }

    /// Apply a whole turn's decisions atomically.
    ///
    /// Either every decision applies and the turn ends (or the game is won),
    /// or the table is left untouched.
    pub fn eval_turn(
        &mut self,
        player: &str,
        decisions: &[PlayerDecision],
    ) -> Result<Vec<DecisionOutcome>, DomainError> {
        let mut scratch = self.clone();
        let mut outcomes = Vec::with_capacity(decisions.len());
        for decision in decisions {
            outcomes.push(scratch.eval_decision(player, decision)?);
        }
        if scratch.winner.is_none() && !scratch.turn_complete() {
            return Err(DomainError::validation(
                ValidationKind::IncompleteTurn,
                format!(
                    "Decisions leave {player}'s turn unfinished; still eligible: {:?}",
                    scratch.eligible_decisions(player)
                ),
            ));
        }
        *self = scratch;
        Ok(outcomes)
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            draw: self.draw.clone(),
            discard: self.discard.clone(),
            roster: self.roster.clone(),
            hands: self.hands.clone(),
            direction: self.direction,
            required_color: self.required_color,
            phase: self.phase,
            pending: self.pending,
            shuffler: self.shuffler.clone(),
            current: self.current,
            next_turn: self.next_turn,
            shuffled: self.shuffled,
            winner: self.winner,
        }
    }

    /// Rebuild a table from a snapshot, re-checking every invariant.
    pub fn from_snapshot(snapshot: TableSnapshot) -> Result<Self, DomainError> {
        if snapshot.hands.len() != snapshot.roster.len() {
            return Err(DomainError::validation(
                ValidationKind::SnapshotInvalid,
                format!(
                    "{} hands for {} players",
                    snapshot.hands.len(),
                    snapshot.roster.len()
                ),
            ));
        }
        let mut seats = HashMap::with_capacity(snapshot.roster.len());
        for (seat, name) in snapshot.roster.iter().enumerate() {
            if seats.insert(name.clone(), seat).is_some() {
                return Err(DomainError::validation(
                    ValidationKind::SnapshotInvalid,
                    format!("Duplicate player {name} in snapshot"),
                ));
            }
        }

        let table = Self {
            draw: snapshot.draw,
            discard: snapshot.discard,
            hands: snapshot.hands,
            roster: snapshot.roster,
            seats,
            direction: snapshot.direction,
            required_color: snapshot.required_color,
            phase: snapshot.phase,
            pending: snapshot.pending,
            shuffler: snapshot.shuffler,
            current: snapshot.current,
            next_turn: snapshot.next_turn,
            shuffled: snapshot.shuffled,
            winner: snapshot.winner,
        };
        table.check_invariants()?;
        Ok(table)
    }

    /// Verify the structural invariants of the table.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        let invalid = |detail: String| -> Result<(), DomainError> {
            Err(DomainError::validation(ValidationKind::SnapshotInvalid, detail))
        };
        if self.card_count() != DECK_SIZE {
            return invalid(format!("Table holds {} cards, expected {DECK_SIZE}", self.card_count()));
        }
        if self.shuffled && self.discard.is_empty() {
            return invalid("Discard pile empty after the deal".to_string());
        }
        if self.shuffled && self.required_color.map_or(true, Color::is_wild) {
            return invalid("Required color missing after the deal".to_string());
        }
        let players = self.player_count();
        if players > 0 && self.next_turn >= players {
            return invalid(format!("Next turn seat {} out of range", self.next_turn));
        }
        let seats = [
            self.current,
            self.winner,
            self.pending.map(|p| match p {
                PendingEffect::ColorChoice { player, .. } => player,
                PendingEffect::Challenge { challenger, .. } => challenger,
            }),
            self.pending.and_then(|p| match p {
                PendingEffect::Challenge { offender, .. } => Some(offender),
                PendingEffect::ColorChoice { .. } => None,
            }),
        ];
        if seats.into_iter().flatten().any(|seat| seat >= players) {
            return invalid("Seat reference out of range".to_string());
        }
        Ok(())
    }
}

// Decision handlers. Each validates fully before its first mutation.
impl Table {
    fn require_live(&self) -> Result<(), DomainError> {
        if !self.shuffled {
            return Err(DomainError::validation(
                ValidationKind::NotShuffled,
                "Cards have not been dealt",
            ));
        }
        if let Some(winner) = self.winner {
            return Err(DomainError::validation(
                ValidationKind::GameOver,
                format!("{} already won", self.player_at(winner)),
            ));
        }
        Ok(())
    }

    fn expected_actor(&self) -> Option<Seat> {
        match self.pending {
            Some(PendingEffect::ColorChoice { player, .. }) => Some(player),
            _ => self.current,
        }
    }

    fn require_actor(&self, player: &str) -> Result<Seat, DomainError> {
        self.require_live()?;
        let seat = self.seat_of(player).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Player, format!("Unknown player {player}"))
        })?;
        match self.expected_actor() {
            Some(actor) if actor == seat => Ok(seat),
            Some(actor) => Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                format!("Waiting on {}, not {player}", self.player_at(actor)),
            )),
            None => Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                "No turn in progress",
            )),
        }
    }

    fn require_no_pending(&self, kind: DecisionKind) -> Result<(), DomainError> {
        match self.pending {
            Some(PendingEffect::ColorChoice { .. }) => Err(DomainError::validation(
                ValidationKind::UnexpectedDecision,
                format!("{kind} not allowed: a wild color must be chosen first"),
            )),
            Some(PendingEffect::Challenge { .. }) => Err(DomainError::validation(
                ValidationKind::UnexpectedDecision,
                format!("{kind} not allowed: answer the Wild Draw Four challenge first"),
            )),
            None => Ok(()),
        }
    }

    fn require_discard_top(&self) -> Result<(Card, Color), DomainError> {
        match (self.discard.top(), self.required_color) {
            (Some(top), Some(required)) => Ok((top, required)),
            _ => Err(DomainError::validation_other(
                "Invariant violated: discard top and required color must be set",
            )),
        }
    }

    fn can_pull_from_deck(&self) -> bool {
        !self.draw.is_empty()
    }

    /// The active discard always stays on the pile.
    fn can_pull_from_pile(&self) -> bool {
        self.discard.len() >= 2
    }

    fn may_pass(&self) -> bool {
        match self.phase {
            TurnPhase::CardDrawn => true,
            TurnPhase::Start => !self.can_pull_from_deck() && !self.can_pull_from_pile(),
            TurnPhase::CardPlayed => false,
        }
    }

    fn has_playable(&self, seat: Seat) -> bool {
        let Ok((top, required)) = self.require_discard_top() else {
            return false;
        };
        self.hands[seat]
            .iter()
            .any(|&card| is_playable(card, top, required))
    }

    fn require_first_draw(&self, kind: DecisionKind) -> Result<(), DomainError> {
        self.require_no_pending(kind)?;
        if self.phase != TurnPhase::Start {
            return Err(DomainError::validation(
                ValidationKind::AlreadyDrewCard,
                "Only one card may be drawn per turn",
            ));
        }
        Ok(())
    }

    fn transfer(
        &self,
        source: CardLocation,
        sink: CardLocation,
        seat: Seat,
        card: Card,
    ) -> TableEvent {
        TableEvent::CardTransfer(CardTransfer {
            source,
            sink,
            player: self.player_at(seat).to_string(),
            card,
        })
    }

    fn end_turn(&mut self, next: Seat) {
        self.current = None;
        self.phase = TurnPhase::Start;
        self.next_turn = next;
    }

    fn seat_after(&self, seat: Seat, steps: usize) -> Seat {
        nth_seat(seat, steps, self.direction, self.player_count())
    }

    /// Move up to `count` cards from the draw pile into `seat`'s hand.
    fn force_draw(&mut self, seat: Seat, count: usize, events: &mut Vec<TableEvent>) {
        for drawn in 0..count {
            let Some(card) = self.draw.pop() else {
                warn!(
                    player = self.player_at(seat),
                    owed = count,
                    drawn,
                    "Draw pile exhausted during a penalty draw"
                );
                return;
            };
            self.hands[seat].push(card);
            events.push(self.transfer(CardLocation::DrawPile, CardLocation::Hand, seat, card));
        }
    }

    fn pull_from_deck(&mut self, seat: Seat, events: &mut Vec<TableEvent>) -> Result<(), DomainError> {
        self.require_first_draw(DecisionKind::PullFromDeck)?;
        let Some(card) = self.draw.pop() else {
            return Err(DomainError::validation(
                ValidationKind::DeckEmpty,
                "Draw pile is empty",
            ));
        };
        self.hands[seat].push(card);
        events.push(self.transfer(CardLocation::DrawPile, CardLocation::Hand, seat, card));
        self.phase = TurnPhase::CardDrawn;
        self.next_turn = self.seat_after(seat, 1);
        Ok(())
    }

    fn pull_from_pile(&mut self, seat: Seat, events: &mut Vec<TableEvent>) -> Result<(), DomainError> {
        self.require_first_draw(DecisionKind::PullFromPile)?;
        if !self.can_pull_from_pile() {
            return Err(DomainError::validation(
                ValidationKind::PileEmpty,
                "Discard pile has no card beneath the active one",
            ));
        }
        let Some(card) = self.discard.pop() else {
            return Err(DomainError::validation(
                ValidationKind::PileEmpty,
                "Discard pile is empty",
            ));
        };
        self.hands[seat].push(card);
        // A wild underneath keeps the color chosen so far.
        if let Some(top) = self.discard.top().filter(|top| !top.is_wild()) {
            self.required_color = Some(top.color);
        }
        events.push(self.transfer(CardLocation::DiscardPile, CardLocation::Hand, seat, card));
        self.phase = TurnPhase::CardDrawn;
        self.next_turn = self.seat_after(seat, 1);
        Ok(())
    }

    fn play_hand_card(
        &mut self,
        seat: Seat,
        card: Option<Card>,
        events: &mut Vec<TableEvent>,
    ) -> Result<(), DomainError> {
        self.require_no_pending(DecisionKind::PlayHandCard)?;
        let card = card.ok_or_else(|| {
            DomainError::validation(ValidationKind::MissingCard, "PlayHandCard needs a card")
        })?;
        if !self.hands[seat].contains(card) {
            return Err(DomainError::validation(
                ValidationKind::CardNotInHand,
                format!("{card} is not in {}'s hand", self.player_at(seat)),
            ));
        }
        let (top, required) = self.require_discard_top()?;
        if !is_playable(card, top, required) {
            return Err(DomainError::validation(
                ValidationKind::IllegalPlay,
                format!("{card} does not match {top} or required color {required}"),
            ));
        }
        let had_alternative = card.rank == Rank::WildDrawFour
            && has_playable_besides(self.hands[seat].as_slice(), card, top, required);

        self.hands[seat].remove_card(card);
        self.discard.push(card);
        events.push(self.transfer(CardLocation::Hand, CardLocation::DiscardPile, seat, card));
        self.apply_card_effect(seat, card, had_alternative, events);
        Ok(())
    }

    fn apply_card_effect(
        &mut self,
        seat: Seat,
        card: Card,
        had_alternative: bool,
        events: &mut Vec<TableEvent>,
    ) {
        match card.rank {
            Rank::Wild | Rank::WildDrawFour => {
                self.phase = TurnPhase::CardPlayed;
                self.pending = Some(PendingEffect::ColorChoice {
                    player: seat,
                    draw_four: card.rank == Rank::WildDrawFour,
                    had_alternative,
                });
                self.next_turn = self.seat_after(seat, 1);
            }
            Rank::Skip => {
                self.required_color = Some(card.color);
                let skipped = self.seat_after(seat, 1);
                events.push(TableEvent::TurnSkipped {
                    player: self.player_at(skipped).to_string(),
                });
                self.end_turn(self.seat_after(seat, 2));
            }
            Rank::Reverse => {
                self.required_color = Some(card.color);
                self.direction = self.direction.reversed();
                events.push(TableEvent::DirectionChanged {
                    direction: self.direction,
                });
                self.end_turn(self.seat_after(seat, 1));
            }
            Rank::DrawTwo => {
                self.required_color = Some(card.color);
                let victim = self.seat_after(seat, 1);
                self.force_draw(victim, DRAW_TWO_PENALTY, events);
                events.push(TableEvent::TurnSkipped {
                    player: self.player_at(victim).to_string(),
                });
                self.end_turn(self.seat_after(seat, 2));
            }
            _ => {
                self.required_color = Some(card.color);
                self.end_turn(self.seat_after(seat, 1));
            }
        }
    }

    fn choose_color(
        &mut self,
        seat: Seat,
        color: Option<Color>,
        events: &mut Vec<TableEvent>,
    ) -> Result<(), DomainError> {
        let Some(PendingEffect::ColorChoice {
            draw_four,
            had_alternative,
            ..
        }) = self.pending
        else {
            return Err(DomainError::validation(
                ValidationKind::UnexpectedDecision,
                "No wild card is waiting for a color",
            ));
        };
        let color = color.ok_or_else(|| {
            DomainError::validation(ValidationKind::MissingColor, "WildColorChoice needs a color")
        })?;
        if color.is_wild() {
            return Err(DomainError::validation(
                ValidationKind::IllegalColor,
                "Wild is not a color that can be required",
            ));
        }

        self.required_color = Some(color);
        events.push(TableEvent::ColorChosen {
            player: self.player_at(seat).to_string(),
            color,
        });
        let next = self.seat_after(seat, 1);
        self.pending = draw_four.then_some(PendingEffect::Challenge {
            challenger: next,
            offender: seat,
            had_alternative,
        });
        self.end_turn(next);
        Ok(())
    }

    fn answer_challenge(
        &mut self,
        seat: Seat,
        challenge: bool,
        events: &mut Vec<TableEvent>,
    ) -> Result<(), DomainError> {
        let kind = if challenge {
            DecisionKind::Challenge
        } else {
            DecisionKind::NoChallenge
        };
        let Some(PendingEffect::Challenge {
            challenger,
            offender,
            had_alternative,
        }) = self.pending
        else {
            return Err(DomainError::validation(
                ValidationKind::UnexpectedDecision,
                format!("{kind} not allowed: no Wild Draw Four to answer"),
            ));
        };
        if challenger != seat {
            return Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                format!("Only {} may answer the challenge", self.player_at(challenger)),
            ));
        }

        self.pending = None;
        let next = self.seat_after(seat, 1);
        if !challenge {
            self.force_draw(seat, DRAW_FOUR_PENALTY, events);
            events.push(TableEvent::TurnSkipped {
                player: self.player_at(seat).to_string(),
            });
            self.end_turn(next);
            return Ok(());
        }

        let penalized = if had_alternative { offender } else { seat };
        self.force_draw(penalized, CHALLENGE_PENALTY, events);
        events.push(TableEvent::ChallengeResolved {
            challenger: self.player_at(seat).to_string(),
            offender: self.player_at(offender).to_string(),
            upheld: had_alternative,
            penalized: self.player_at(penalized).to_string(),
        });
        if had_alternative {
            // Challenger plays their turn as usual.
            self.next_turn = next;
        } else {
            events.push(TableEvent::TurnSkipped {
                player: self.player_at(seat).to_string(),
            });
            self.end_turn(next);
        }
        Ok(())
    }

    fn pass(&mut self, seat: Seat) -> Result<(), DomainError> {
        self.require_no_pending(DecisionKind::Pass)?;
        if !self.may_pass() {
            return Err(DomainError::validation(
                ValidationKind::MustDrawFirst,
                "Draw a card before passing",
            ));
        }
        self.end_turn(self.seat_after(seat, 1));
        Ok(())
    }
}

#[cfg(test)]
impl Table {
    /// Build a dealt table from explicit piles. Test-only.
    pub(crate) fn rigged(
        players: &[&str],
        hands: Vec<Vec<Card>>,
        discard: Vec<Card>,
        required_color: Color,
    ) -> Self {
        let mut table = Table::new();
        for p in players {
            table.add_player(p).unwrap();
        }
        let mut draw = Deck::full().as_slice().to_vec();
        let mut take = |card: &Card| {
            let pos = draw
                .iter()
                .position(|c| c == card)
                .unwrap_or_else(|| panic!("{card} not left in the deck"));
            draw.remove(pos);
        };
        for card in hands.iter().flatten().chain(discard.iter()) {
            take(card);
        }
        table.draw = Deck::from_cards(draw);
        table.hands = hands.into_iter().map(Deck::from_cards).collect();
        table.discard = Deck::from_cards(discard);
        table.required_color = Some(required_color);
        table.shuffler = Some(players[players.len() - 1].to_string());
        table.next_turn = 0;
        table.shuffled = true;
        table
    }
}
