//! Single writer for one game session.
//!
//! Every mutation goes through [`TurnOrchestrator`]. After each one it
//! cancels the pending timer, publishes the new state, and arms the next
//! timer: a thinking delay for bots or the turn countdown for humans. Timers
//! capture the session's turn generation when armed and do nothing if the
//! generation has moved on by the time they fire.

use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use nothanks_ai::params::{Difficulty, PolicyParams};
use nothanks_ai::{decide_for, DecisionPolicy};
use nothanks_engine::errors::GameError;
use nothanks_engine::game::{GameSession, Phase, TurnOutcome};
use nothanks_engine::player::{PlayerId, TurnAction};
use nothanks_engine::settings::{GameSettings, SettingsPatch};
use nothanks_engine::snapshot::PublicSnapshot;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinHandle;

use crate::errors::IntoErrorResponse;
use crate::events::{EventBus, GameEvent};
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub bot_delay_min: Duration,
    pub bot_delay_max: Duration,
    /// Seeds thinking delays and minted bot seeds; `None` draws one
    pub delay_seed: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            bot_delay_min: Duration::from_millis(600),
            bot_delay_max: Duration::from_millis(1800),
            delay_seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    BotThinking,
    TurnTimeout,
}

struct PendingTimer {
    generation: u64,
    kind: TimerKind,
    handle: JoinHandle<()>,
}

/// Owns a [`GameSession`] and sequences every change to it.
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct TurnOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    session_id: SessionId,
    game: Mutex<GameSession>,
    // lock order: game, then pending
    pending: Mutex<Option<PendingTimer>>,
    policy: Box<dyn DecisionPolicy>,
    bus: EventBus,
    config: OrchestratorConfig,
    rng: Mutex<ChaCha8Rng>,
    last_active: Mutex<Instant>,
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("session_id", &self.inner.session_id)
            .field("policy", &self.inner.policy.name())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl TurnOrchestrator {
    pub fn new(
        session_id: SessionId,
        game: GameSession,
        bus: EventBus,
        policy: Box<dyn DecisionPolicy>,
        config: OrchestratorConfig,
    ) -> Self {
        let seed = config.delay_seed.unwrap_or_else(rand::random);
        Self {
            inner: Arc::new(Inner {
                session_id,
                game: Mutex::new(game),
                pending: Mutex::new(None),
                policy,
                bus,
                config,
                rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
                last_active: Mutex::new(Instant::now()),
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    // ---- inbound operations -----------------------------------------

    pub fn join(&self, player_id: &str, name: &str) -> Result<(), GameError> {
        self.apply(Some(player_id), |game| game.add_player(player_id, name))
    }

    pub fn leave(&self, player_id: &str) -> Result<(), GameError> {
        self.apply(Some(player_id), |game| game.remove_player(player_id).map(|_| ()))
    }

    /// Host-only. Applies `patch` through the clamping path, then deals.
    pub fn start(&self, requester: &str, patch: Option<&SettingsPatch>) -> Result<(), GameError> {
        self.apply(Some(requester), |game| {
            game.require_host(requester)?;
            game.start(patch)
        })
    }

    pub fn pass(&self, player_id: &str) -> Result<TurnOutcome, GameError> {
        self.apply(Some(player_id), |game| game.pass(player_id))
    }

    pub fn take(&self, player_id: &str) -> Result<TurnOutcome, GameError> {
        self.apply(Some(player_id), |game| game.take(player_id))
    }

    pub fn update_settings(
        &self,
        requester: &str,
        patch: &SettingsPatch,
    ) -> Result<GameSettings, GameError> {
        self.apply(Some(requester), |game| {
            game.require_host(requester)?;
            game.update_settings(patch)
        })
    }

    pub fn transfer_host(&self, requester: &str, target: &str) -> Result<(), GameError> {
        self.apply(Some(requester), |game| game.transfer_host(requester, target))
    }

    /// Host-only. Seats a computer player and returns its id.
    pub fn add_bot(&self, requester: &str, difficulty: Difficulty) -> Result<PlayerId, GameError> {
        let bot_seed: u64 = self.lock_rng().random();
        let id = format!("bot-{}", uuid::Uuid::new_v4());
        self.apply(Some(requester), |game| {
            game.require_host(requester)?;
            let name = free_bot_name(game, difficulty);
            let params = PolicyParams::new(difficulty, bot_seed).to_value();
            game.add_computer(id.clone(), &name, params)?;
            tracing::info!(
                session_id = %self.inner.session_id,
                player_id = %id,
                difficulty = %difficulty,
                "bot added"
            );
            Ok(id.clone())
        })
    }

    /// Host-only. Unseats a computer player.
    pub fn remove_bot(&self, requester: &str, bot_id: &str) -> Result<(), GameError> {
        self.apply(Some(requester), |game| {
            game.require_host(requester)?;
            let bot = game
                .player(bot_id)
                .ok_or_else(|| GameError::PlayerNotFound(bot_id.to_string()))?;
            if !bot.is_computer() {
                return Err(GameError::NotABot(bot_id.to_string()));
            }
            game.remove_player(bot_id).map(|_| ())
        })
    }

    // ---- queries ------------------------------------------------------

    pub fn snapshot(&self) -> PublicSnapshot {
        self.read(PublicSnapshot::of)
    }

    /// Runs `f` against the session under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&GameSession) -> R) -> R {
        f(&self.lock_game())
    }

    /// Generation and kind of the armed timer, if any.
    pub fn pending_timer(&self) -> Option<(u64, TimerKind)> {
        self.lock_pending()
            .as_ref()
            .map(|p| (p.generation, p.kind))
    }

    pub fn human_count(&self) -> usize {
        self.read(|game| game.players().iter().filter(|p| !p.is_computer()).count())
    }

    pub fn is_idle(&self, ttl: Duration) -> bool {
        self.inner
            .last_active
            .lock()
            .map(|t| t.elapsed() >= ttl)
            .unwrap_or(true)
    }

    /// Cancels any pending timer. Used when the session closes.
    pub fn shutdown(&self) {
        if let Some(pending) = self.lock_pending().take() {
            pending.handle.abort();
        }
    }

    // ---- mutation pipeline -------------------------------------------

    fn apply<T>(
        &self,
        actor: Option<&str>,
        op: impl FnOnce(&mut GameSession) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        self.touch();
        let result = {
            let mut game = self.lock_game();
            let result = op(&mut game);
            if result.is_ok() {
                self.after_mutation(&mut game);
            }
            result
        };
        if let Err(err) = &result {
            self.reject(actor, err);
        }
        result
    }

    fn reject(&self, actor: Option<&str>, err: &GameError) {
        let response = tracing::info_span!(
            "reject",
            session_id = %self.inner.session_id,
            player_id = actor.unwrap_or("-")
        )
        .in_scope(|| err.logged_response());
        self.inner.bus.broadcast(
            &self.inner.session_id,
            GameEvent::ActionRejected {
                session_id: self.inner.session_id.clone(),
                player_id: actor.map(str::to_string),
                kind: err.kind(),
                message: response.message,
            },
        );
    }

    /// Publishes, finishes rounds and arms the next timer. Turns that
    /// cannot be scheduled are resolved on the spot, hence the loop.
    fn after_mutation(&self, game: &mut GameSession) {
        loop {
            self.cancel_pending();
            self.publish(game);

            match game.phase() {
                Phase::Lobby => return,
                Phase::RoundOver => {
                    if let Some(standings) = game.last_standings() {
                        self.inner.bus.broadcast(
                            &self.inner.session_id,
                            GameEvent::RoundEnded {
                                session_id: self.inner.session_id.clone(),
                                standings: standings.to_vec(),
                            },
                        );
                    }
                    if let Err(err) = game.soft_reset() {
                        tracing::error!(
                            session_id = %self.inner.session_id,
                            error = %err,
                            "soft reset failed"
                        );
                        return;
                    }
                    self.publish(game);
                    return;
                }
                Phase::InTurn => {
                    if !self.schedule(game) {
                        return;
                    }
                    if !self.resolve_now(game) {
                        return;
                    }
                }
            }
        }
    }

    fn publish(&self, game: &GameSession) {
        self.inner.bus.broadcast(
            &self.inner.session_id,
            GameEvent::StateChanged {
                session_id: self.inner.session_id.clone(),
                snapshot: PublicSnapshot::of(game),
            },
        );
    }

    /// Arms the timer for the current turn. Returns true when the turn must
    /// be resolved immediately because no timer could be scheduled.
    fn schedule(&self, game: &GameSession) -> bool {
        let Some(player) = game.current_player() else {
            return false;
        };
        let generation = game.turn_generation();
        let (kind, delay) = if player.is_computer() {
            (TimerKind::BotThinking, self.thinking_delay())
        } else if game.settings().turn_timer_enabled() {
            let limit = Duration::from_secs(u64::from(game.settings().turn_time_limit_seconds));
            (TimerKind::TurnTimeout, remaining_turn_time(game, limit))
        } else {
            return false;
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::warn!(
                    session_id = %self.inner.session_id,
                    player_id = %player.id(),
                    generation,
                    error = %err,
                    "no runtime for turn timer, resolving now"
                );
                return true;
            }
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                TurnOrchestrator { inner }.fire(generation);
            }
        });
        tracing::debug!(
            session_id = %self.inner.session_id,
            player_id = %player.id(),
            generation,
            timer = ?kind,
            delay_ms = delay.as_millis() as u64,
            "turn timer armed"
        );
        *self.lock_pending() = Some(PendingTimer {
            generation,
            kind,
            handle,
        });
        false
    }

    /// Timer callback. Applies the default or bot action if the session is
    /// still on `generation`; returns whether anything was applied.
    pub fn fire(&self, generation: u64) -> bool {
        let mut game = self.lock_game();
        if game.phase() != Phase::InTurn || game.turn_generation() != generation {
            tracing::debug!(
                session_id = %self.inner.session_id,
                generation,
                current = game.turn_generation(),
                "stale timer ignored"
            );
            return false;
        }
        {
            let mut pending = self.lock_pending();
            if pending.as_ref().is_some_and(|p| p.generation == generation) {
                // the running task is this one; dropping the handle detaches it
                pending.take();
            }
        }
        if self.resolve_now(&mut game) {
            self.after_mutation(&mut game);
            true
        } else {
            false
        }
    }

    /// Applies the current player's automatic action. Returns whether the
    /// session changed.
    fn resolve_now(&self, game: &mut GameSession) -> bool {
        let Some(player) = game.current_player() else {
            return false;
        };
        let id = player.id().clone();
        let action = if player.is_computer() {
            decide_for(self.inner.policy.as_ref(), game, &id).action()
        } else if player.tokens() > 0 {
            TurnAction::Pass
        } else {
            TurnAction::Take
        };

        let result = match action {
            TurnAction::Pass => game.pass(&id),
            TurnAction::Take => game.take(&id),
        };
        match result {
            Ok(outcome) => {
                tracing::debug!(
                    session_id = %self.inner.session_id,
                    player_id = %id,
                    action = ?outcome.action,
                    forced = outcome.forced,
                    card = %outcome.card,
                    "automatic action applied"
                );
                true
            }
            Err(err) => {
                tracing::error!(
                    session_id = %self.inner.session_id,
                    player_id = %id,
                    error = %err,
                    "automatic action rejected"
                );
                false
            }
        }
    }

    fn cancel_pending(&self) {
        if let Some(pending) = self.lock_pending().take() {
            pending.handle.abort();
        }
    }

    fn thinking_delay(&self) -> Duration {
        let min = self.inner.config.bot_delay_min.as_millis() as u64;
        let max = self.inner.config.bot_delay_max.as_millis() as u64;
        let ms = if max > min {
            self.lock_rng().random_range(min..=max)
        } else {
            min
        };
        Duration::from_millis(ms)
    }

    fn touch(&self) {
        if let Ok(mut t) = self.inner.last_active.lock() {
            *t = Instant::now();
        }
    }

    fn lock_game(&self) -> std::sync::MutexGuard<'_, GameSession> {
        self.inner.game.lock().expect("game lock poisoned")
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<PendingTimer>> {
        self.inner.pending.lock().expect("timer lock poisoned")
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, ChaCha8Rng> {
        self.inner.rng.lock().expect("rng lock poisoned")
    }
}

/// What is left of the countdown. A re-armed timer for the same turn (say,
/// after a waiting player left) does not hand the actor a fresh limit.
fn remaining_turn_time(game: &GameSession, limit: Duration) -> Duration {
    let elapsed = game
        .turn_started_at()
        .and_then(|started| (Utc::now() - started).to_std().ok())
        .unwrap_or_default();
    limit.saturating_sub(elapsed)
}

fn free_bot_name(game: &GameSession, difficulty: Difficulty) -> String {
    let label = match difficulty {
        Difficulty::Easy => "Easy Bot",
        Difficulty::Medium => "Bot",
        Difficulty::Hard => "Hard Bot",
    };
    (1..)
        .map(|n| format!("{label} {n}"))
        .find(|name| {
            !game
                .players()
                .iter()
                .any(|p| p.name().eq_ignore_ascii_case(name))
        })
        .unwrap_or_else(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TestLogSubscriber;
    use nothanks_ai::create_policy;
    use tracing::Level;

    fn orchestrator() -> TurnOrchestrator {
        TurnOrchestrator::new(
            "s".into(),
            GameSession::new(Some(3)),
            EventBus::new(),
            create_policy("tiered"),
            OrchestratorConfig {
                bot_delay_min: Duration::from_millis(1),
                bot_delay_max: Duration::from_millis(2),
                delay_seed: Some(9),
            },
        )
    }

    fn untimed() -> SettingsPatch {
        SettingsPatch {
            turn_time_limit_seconds: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn host_only_operations_are_guarded() {
        let orch = orchestrator();
        orch.join("a", "Ann").unwrap();
        orch.join("b", "Bob").unwrap();
        assert_eq!(orch.start("b", None), Err(GameError::NotHost));
        assert_eq!(
            orch.add_bot("b", Difficulty::Easy),
            Err(GameError::NotHost)
        );
        assert_eq!(orch.remove_bot("a", "b"), Err(GameError::NotABot("b".into())));
    }

    #[test]
    fn untimed_human_turn_waits() {
        let orch = orchestrator();
        orch.join("a", "Ann").unwrap();
        orch.join("b", "Bob").unwrap();
        orch.start("a", Some(&untimed())).unwrap();
        assert!(orch.pending_timer().is_none());
        assert_eq!(orch.snapshot().phase, Phase::InTurn);
    }

    #[test]
    fn without_runtime_bots_play_out_the_round() {
        let orch = orchestrator();
        orch.join("a", "Ann").unwrap();
        orch.add_bot("a", Difficulty::Hard).unwrap();
        orch.add_bot("a", Difficulty::Easy).unwrap();
        // a human with no countdown halts the cascade on their turn
        orch.start("a", Some(&untimed())).unwrap();
        orch.read(|game| {
            assert!(game.check_invariants().is_ok());
            if game.phase() == Phase::InTurn {
                assert_eq!(game.current_player_id().map(String::as_str), Some("a"));
            }
        });
    }

    #[test]
    fn stale_generation_is_a_no_op() {
        let orch = orchestrator();
        orch.join("a", "Ann").unwrap();
        orch.join("b", "Bob").unwrap();
        orch.start("a", Some(&untimed())).unwrap();
        let generation = orch.read(|g| g.turn_generation());
        let current = orch.read(|g| g.current_player_id().cloned()).unwrap();
        orch.pass(&current).unwrap();

        let before = orch.snapshot();
        let (fired, logs) = TestLogSubscriber::capture(|| orch.fire(generation));
        assert!(!fired);
        assert_eq!(orch.snapshot(), before);

        let entry = logs
            .entries()
            .into_iter()
            .find(|e| e.message == "stale timer ignored")
            .expect("stale timer logged");
        assert_eq!(entry.level, Level::DEBUG);
        assert_eq!(entry.field("generation"), Some(generation.to_string().as_str()));
    }

    #[test]
    fn rejections_are_logged_as_client_errors() {
        let orch = orchestrator();
        orch.join("a", "Ann").unwrap();
        orch.join("b", "Bob").unwrap();
        let (result, logs) = TestLogSubscriber::capture(|| orch.start("b", None));
        assert_eq!(result, Err(GameError::NotHost));

        let entry = logs
            .entries()
            .into_iter()
            .find(|e| e.message.starts_with("client error"))
            .expect("rejection logged");
        assert_eq!(entry.level, Level::INFO);
        assert_eq!(entry.field("code"), Some("authorization_error"));
    }

    #[test]
    fn broken_bot_params_fall_back_with_a_warning() {
        let mut game = GameSession::new(Some(5));
        game.add_player("a", "Ann").unwrap();
        game.add_computer("bot", "Bot", serde_json::json!({"difficulty": ["not", "a", "tier"]}))
            .unwrap();
        let orch = TurnOrchestrator::new(
            "s".into(),
            game,
            EventBus::new(),
            create_policy("tiered"),
            OrchestratorConfig::default(),
        );

        let ((), logs) = TestLogSubscriber::capture(|| {
            orch.start("a", Some(&untimed())).unwrap();
            if orch.read(|g| g.current_player_id().cloned()).as_deref() == Some("a") {
                orch.pass("a").unwrap();
            }
        });

        // the bot had tokens, so the fail-safe deferred and the turn came back
        assert_eq!(
            orch.read(|g| g.current_player_id().cloned()).as_deref(),
            Some("a")
        );
        assert!(logs.contains(Level::WARN, "policy failed, using fail-safe"));
        assert!(logs.contains(Level::WARN, "no runtime for turn timer"));
    }

    #[test]
    fn current_generation_fire_applies_default_action() {
        let orch = orchestrator();
        orch.join("a", "Ann").unwrap();
        orch.join("b", "Bob").unwrap();
        orch.start("a", Some(&untimed())).unwrap();
        let generation = orch.read(|g| g.turn_generation());
        let current = orch.read(|g| g.current_player_id().cloned()).unwrap();

        assert!(orch.fire(generation));
        let tokens = orch.read(|g| g.player(&current).map(|p| p.tokens()));
        assert_eq!(tokens, Some(10));
        assert_eq!(orch.snapshot().tokens_on_pile, 1);
    }

    #[test]
    fn bot_names_do_not_collide() {
        let orch = orchestrator();
        orch.join("a", "Ann").unwrap();
        orch.add_bot("a", Difficulty::Medium).unwrap();
        orch.add_bot("a", Difficulty::Medium).unwrap();
        let names: Vec<String> =
            orch.read(|g| g.players().iter().map(|p| p.name().to_string()).collect());
        assert_eq!(names, vec!["Ann", "Bot 1", "Bot 2"]);
    }
}
