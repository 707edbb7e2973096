use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, CARD_COUNT};
use crate::deck::{self, Deck};
use crate::errors::GameError;
use crate::logger::ActionRecord;
use crate::player::{Player, PlayerId, TurnAction};
use crate::scoring::{self, Standing};
use crate::settings::{GameSettings, SettingsPatch};

/// Fewest seated players a round can start with
pub const MIN_PLAYERS: usize = 2;
/// Seats at the table, humans and bots together
pub const MAX_PLAYERS: usize = 7;
/// Seats that may be computer-controlled
pub const MAX_BOTS: usize = 6;
pub const MAX_NAME_LEN: usize = 24;

/// Lifecycle of a session: `Lobby -> InTurn -> RoundOver -> (soft reset) -> Lobby`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Seats open, settings editable
    Lobby,
    /// A card is face-up and the current player must act
    InTurn,
    /// Deck exhausted; final standings are available
    RoundOver,
}

/// The face-up card and the tokens riding on it.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TablePile {
    pub current_card: Option<Card>,
    pub tokens: u32,
}

/// What a successful pass or take resolved to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TurnOutcome {
    /// The action that was applied
    pub action: TurnAction,
    /// True when a pass was redirected into a take
    pub forced: bool,
    pub card: Card,
    /// Tokens collected (take) or placed (pass)
    pub tokens_moved: u32,
    pub round_over: bool,
}

/// Authoritative state of one game session.
///
/// Every operation validates first and mutates second, so a rejected call
/// leaves the session untouched.
///
/// # Examples
///
/// ```
/// use nothanks_engine::game::{GameSession, Phase};
///
/// let mut game = GameSession::new(Some(42));
/// game.add_player("a", "Ann").unwrap();
/// game.add_player("b", "Bob").unwrap();
/// game.start(None).unwrap();
///
/// assert_eq!(game.phase(), Phase::InTurn);
/// assert_eq!(game.deck_size(), 23);
/// assert!(game.check_invariants().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GameSession {
    settings: GameSettings,
    /// Seats in turn order once a round starts, join order before that
    players: Vec<Player>,
    deck: Deck,
    removed: Vec<Card>,
    pile: TablePile,
    current: usize,
    phase: Phase,
    host: Option<PlayerId>,
    turn_started_at: Option<DateTime<Utc>>,
    /// Bumped whenever the turn, the face-up card or the phase changes
    generation: u64,
    next_join_seq: u64,
    history: Vec<ActionRecord>,
    last_standings: Option<Vec<Standing>>,
    seed: u64,
    rng: ChaCha20Rng,
}

impl GameSession {
    /// Creates an empty lobby. `None` draws a fresh seed.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            settings: GameSettings::default(),
            players: Vec::with_capacity(MAX_PLAYERS),
            deck: Deck::from_cards(deck::build()),
            removed: Vec::new(),
            pile: TablePile::default(),
            current: 0,
            phase: Phase::Lobby,
            host: None,
            turn_started_at: None,
            generation: 0,
            next_join_seq: 0,
            history: Vec::new(),
            last_standings: None,
            seed,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    // ---- lobby -------------------------------------------------------

    /// Seats a human. The first successful join becomes host.
    pub fn add_player(
        &mut self,
        id: impl Into<PlayerId>,
        name: &str,
    ) -> Result<(), GameError> {
        let id = id.into();
        let name = self.validate_seat(&id, name)?;
        let seq = self.next_seq();
        self.players.push(Player::human(id.clone(), name, seq));
        if self.host.is_none() {
            self.host = Some(id);
        }
        Ok(())
    }

    /// Seats a computer participant carrying opaque policy parameters.
    pub fn add_computer(
        &mut self,
        id: impl Into<PlayerId>,
        name: &str,
        policy_params: serde_json::Value,
    ) -> Result<(), GameError> {
        let id = id.into();
        let name = self.validate_seat(&id, name)?;
        if self.bot_count() >= MAX_BOTS {
            return Err(GameError::BotLimitReached { max: MAX_BOTS });
        }
        let seq = self.next_seq();
        self.players
            .push(Player::computer(id, name, seq, policy_params));
        Ok(())
    }

    fn validate_seat(&self, id: &PlayerId, name: &str) -> Result<String, GameError> {
        if self.phase != Phase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(GameError::NameTooLong { max: MAX_NAME_LEN });
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::LobbyFull { max: MAX_PLAYERS });
        }
        if self
            .players
            .iter()
            .any(|p| p.name().eq_ignore_ascii_case(name))
        {
            return Err(GameError::DuplicateName(name.to_string()));
        }
        if self.player(id).is_some() {
            return Err(GameError::DuplicateId(id.clone()));
        }
        Ok(name.to_string())
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_join_seq;
        self.next_join_seq += 1;
        seq
    }

    /// Unseats a player in any phase.
    ///
    /// Mid-round the leaver's cards join the removed set and their tokens
    /// leave play. If the leaver was acting, the turn passes to whoever now
    /// occupies the seat; otherwise the current turn carries on untouched. If
    /// too few players remain the round ends on the spot.
    pub fn remove_player(&mut self, id: &str) -> Result<Player, GameError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| GameError::PlayerNotFound(id.to_string()))?;
        let mut leaver = self.players.remove(idx);

        if self.host.as_deref() == Some(id) {
            self.host = self
                .players
                .iter()
                .find(|p| !p.is_computer())
                .map(|p| p.id().clone());
        }

        if self.phase == Phase::InTurn {
            self.removed.extend(leaver.surrender_cards());
            let seat_changed = idx == self.current;
            if idx < self.current {
                self.current -= 1;
            }
            if self.players.len() < MIN_PLAYERS {
                self.finish_round();
            } else {
                if self.current >= self.players.len() {
                    self.current = 0;
                }
                // the actor keeps their clock unless it was the leaver's turn
                if seat_changed {
                    self.begin_turn();
                }
            }
        } else if self.phase == Phase::RoundOver {
            self.removed.extend(leaver.surrender_cards());
        }

        tracing::debug!(player_id = %id, remaining = self.players.len(), "player removed");
        Ok(leaver)
    }

    /// Updates lobby settings, clamping each field. Rejected once started.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<GameSettings, GameError> {
        if self.phase != Phase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        self.settings.apply(patch);
        Ok(self.settings)
    }

    pub fn require_host(&self, requester: &str) -> Result<(), GameError> {
        if self.host.as_deref() == Some(requester) {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    pub fn transfer_host(&mut self, requester: &str, target: &str) -> Result<(), GameError> {
        self.require_host(requester)?;
        let target = self
            .player(target)
            .ok_or_else(|| GameError::PlayerNotFound(target.to_string()))?;
        if target.is_computer() {
            return Err(GameError::BotCannotHost(target.id().clone()));
        }
        self.host = Some(target.id().clone());
        Ok(())
    }

    // ---- round -------------------------------------------------------

    /// Seals settings, deals a fresh deck and puts the first card face-up.
    pub fn start(&mut self, settings_override: Option<&SettingsPatch>) -> Result<(), GameError> {
        if self.phase != Phase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                min: MIN_PLAYERS,
                actual: self.players.len(),
            });
        }
        if let Some(patch) = settings_override {
            self.settings.apply(patch);
        }

        let (remaining, removed) = deck::sample_removed(
            deck::build(),
            usize::from(self.settings.removed_count),
            &mut self.rng,
        );
        self.deck = Deck::from_cards(remaining);
        self.removed = removed;
        self.players.shuffle(&mut self.rng);
        for p in &mut self.players {
            p.reset_for_round(self.settings.initial_tokens);
        }
        self.pile = TablePile::default();
        self.history.clear();
        self.last_standings = None;
        self.current = 0;
        self.phase = Phase::InTurn;

        match self.deck.draw() {
            Some(card) => {
                self.pile.current_card = Some(card);
                self.begin_turn();
            }
            None => self.finish_round(),
        }

        tracing::debug!(
            players = self.players.len(),
            removed = self.removed.len(),
            deck = self.deck.remaining(),
            "round started"
        );
        Ok(())
    }

    /// Places a token on the pile and moves the turn on.
    ///
    /// A player without tokens cannot decline: the call resolves as a take.
    pub fn pass(&mut self, player_id: &str) -> Result<TurnOutcome, GameError> {
        self.ensure_turn(player_id)?;
        if self.players[self.current].tokens() == 0 {
            return self.resolve_take(true);
        }
        self.resolve_pass()
    }

    /// Takes the face-up card and its tokens. The turn stays with the taker.
    pub fn take(&mut self, player_id: &str) -> Result<TurnOutcome, GameError> {
        self.ensure_turn(player_id)?;
        self.resolve_take(false)
    }

    fn ensure_turn(&self, player_id: &str) -> Result<(), GameError> {
        if self.phase != Phase::InTurn {
            return Err(GameError::NotStarted);
        }
        let expected = self.players[self.current].id();
        if expected != player_id {
            return Err(GameError::NotPlayersTurn {
                expected: expected.clone(),
                actual: player_id.to_string(),
            });
        }
        Ok(())
    }

    fn resolve_pass(&mut self) -> Result<TurnOutcome, GameError> {
        let card = self.pile.current_card.ok_or(GameError::NotStarted)?;
        let player = &mut self.players[self.current];
        if !player.spend_token() {
            return Err(GameError::NotStarted);
        }
        self.history.push(ActionRecord {
            player_id: player.id().clone(),
            action: TurnAction::Pass,
            card,
            pile_tokens: self.pile.tokens,
        });
        self.pile.tokens += 1;
        self.current = (self.current + 1) % self.players.len();
        self.begin_turn();
        Ok(TurnOutcome {
            action: TurnAction::Pass,
            forced: false,
            card,
            tokens_moved: 1,
            round_over: false,
        })
    }

    fn resolve_take(&mut self, forced: bool) -> Result<TurnOutcome, GameError> {
        let card = self.pile.current_card.ok_or(GameError::NotStarted)?;
        let collected = self.pile.tokens;
        let player = &mut self.players[self.current];
        player.collect(card);
        player.add_tokens(collected);
        self.history.push(ActionRecord {
            player_id: player.id().clone(),
            action: TurnAction::Take,
            card,
            pile_tokens: collected,
        });
        self.pile = TablePile::default();

        let round_over = match self.deck.draw() {
            Some(next) => {
                self.pile.current_card = Some(next);
                self.begin_turn();
                false
            }
            None => {
                self.finish_round();
                true
            }
        };
        Ok(TurnOutcome {
            action: TurnAction::Take,
            forced,
            card,
            tokens_moved: collected,
            round_over,
        })
    }

    fn begin_turn(&mut self) {
        self.generation += 1;
        self.turn_started_at = Some(Utc::now());
    }

    fn finish_round(&mut self) {
        self.generation += 1;
        self.phase = Phase::RoundOver;
        self.turn_started_at = None;
        self.last_standings = Some(self.standings());
        tracing::debug!(actions = self.history.len(), "round over");
    }

    /// Returns to the lobby after a finished round: humans and the host stay,
    /// bots leave, and all round data is cleared.
    pub fn soft_reset(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::RoundOver {
            return Err(GameError::RoundNotOver);
        }
        self.players.retain(|p| !p.is_computer());
        self.players.sort_by_key(|p| p.joined_seq());
        for p in &mut self.players {
            p.reset_for_round(0);
        }
        if self
            .host
            .as_deref()
            .map_or(true, |h| self.index_of(h).is_none())
        {
            self.host = self.players.first().map(|p| p.id().clone());
        }
        self.deck = Deck::from_cards(deck::build());
        self.removed.clear();
        self.pile = TablePile::default();
        self.history.clear();
        self.current = 0;
        self.phase = Phase::Lobby;
        self.turn_started_at = None;
        self.generation += 1;
        Ok(())
    }

    // ---- queries -----------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn is_started(&self) -> bool {
        self.phase != Phase::Lobby
    }
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }
    pub fn players(&self) -> &[Player] {
        &self.players
    }
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }
    fn index_of(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id() == id)
    }
    pub fn bot_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_computer()).count()
    }
    pub fn host_id(&self) -> Option<&PlayerId> {
        self.host.as_ref()
    }

    /// The player who must act, while a round is in progress.
    pub fn current_player(&self) -> Option<&Player> {
        match self.phase {
            Phase::InTurn => self.players.get(self.current),
            _ => None,
        }
    }

    pub fn current_player_id(&self) -> Option<&PlayerId> {
        self.current_player().map(Player::id)
    }

    pub fn pile(&self) -> TablePile {
        self.pile
    }
    pub fn deck_size(&self) -> usize {
        self.deck.remaining()
    }
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
    /// Face-down cards. Never part of public state.
    pub fn removed_cards(&self) -> &[Card] {
        &self.removed
    }
    /// Cards still to be drawn, front first. Never part of public state.
    pub fn undrawn_cards(&self) -> &[Card] {
        self.deck.undrawn()
    }
    pub fn turn_generation(&self) -> u64 {
        self.generation
    }
    pub fn turn_started_at(&self) -> Option<DateTime<Utc>> {
        self.turn_started_at
    }
    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Ranking of the seated players right now. Ties go to the earlier joiner.
    pub fn standings(&self) -> Vec<Standing> {
        let mut by_join: Vec<&Player> = self.players.iter().collect();
        by_join.sort_by_key(|p| p.joined_seq());
        scoring::rank(by_join)
    }

    /// Final table of the most recent finished round.
    pub fn last_standings(&self) -> Option<&[Standing]> {
        self.last_standings.as_deref()
    }

    /// Verifies card conservation and turn-index validity.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(CARD_COUNT);
        let held = self.players.iter().flat_map(|p| p.held().iter());
        let all = held
            .chain(self.deck.undrawn().iter())
            .chain(self.removed.iter())
            .chain(self.pile.current_card.iter());
        for card in all {
            if !seen.insert(*card) {
                return Err(format!("card {card} appears twice"));
            }
        }
        if seen.len() != CARD_COUNT {
            return Err(format!(
                "{} cards accounted for, expected {CARD_COUNT}",
                seen.len()
            ));
        }
        if self.phase == Phase::InTurn {
            if self.current >= self.players.len() {
                return Err(format!(
                    "current index {} out of {} players",
                    self.current,
                    self.players.len()
                ));
            }
            if self.pile.current_card.is_none() {
                return Err("no face-up card during a turn".into());
            }
        }
        if self.phase == Phase::Lobby && self.pile.tokens != 0 {
            return Err("tokens on the pile in the lobby".into());
        }
        Ok(())
    }
}
