//! # nothanks-ai: Computer Players
//!
//! Decides take or defer for one computer seat from a read-only view of the
//! table. Decisions are pure functions of the view and the seat's params, so
//! a seeded bot replays identically.
//!
//! ## Core Components
//!
//! - [`DecisionPolicy`] - Trait every policy implements
//! - [`context`] - The read-only [`DecisionContext`] a policy sees
//! - [`params`] - Difficulty tiers and the opaque per-bot params
//! - [`terms`] - Independent terms the tiers combine
//! - [`policy`] - The tiered policy and a fixed-threshold baseline
//! - [`create_policy`] - Factory by name
//!
//! ## Quick Start
//!
//! ```rust
//! use nothanks_ai::params::{Difficulty, PolicyParams};
//! use nothanks_ai::{create_policy, decide_for};
//! use nothanks_engine::game::GameSession;
//!
//! let mut game = GameSession::new(Some(42));
//! game.add_player("h", "Human").unwrap();
//! let params = PolicyParams::new(Difficulty::Hard, 7).to_value();
//! game.add_computer("bot-1", "Robo", params).unwrap();
//! game.start(None).unwrap();
//!
//! let policy = create_policy("tiered");
//! let decision = decide_for(policy.as_ref(), &game, "bot-1");
//! println!("bot chose {decision:?}");
//! ```

use nothanks_engine::game::GameSession;
use nothanks_engine::player::TurnAction;
use thiserror::Error;

pub mod context;
pub mod params;
pub mod policy;
pub mod terms;

pub use context::DecisionContext;

/// Take the face-up card or pay a token to decline it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Take,
    Defer,
}

impl Decision {
    /// Engine action carrying this decision out.
    pub fn action(self) -> TurnAction {
        match self {
            Decision::Take => TurnAction::Take,
            Decision::Defer => TurnAction::Pass,
        }
    }
}

/// Internal policy failures. Never leave [`DecisionPolicy::decide`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("No face-up card to decide on")]
    MissingCurrentCard,
    #[error("Seat `{0}` not found")]
    SeatNotFound(String),
    #[error("Malformed policy params: {0}")]
    MalformedParams(String),
    #[error("Threshold is not a finite number")]
    NonFinite,
}

/// Interface for computer decision-making.
///
/// Implementors provide [`evaluate_blob`](DecisionPolicy::evaluate_blob);
/// callers use [`decide`](DecisionPolicy::decide), which never fails.
pub trait DecisionPolicy: Send + Sync {
    /// Decision for the seat described by `ctx`, with its opaque params.
    fn evaluate_blob(
        &self,
        ctx: &DecisionContext,
        params: &serde_json::Value,
    ) -> Result<Decision, PolicyError>;

    fn name(&self) -> &str;

    /// Like `evaluate_blob`, but resolves failures to the safe default:
    /// take when the stash is empty, otherwise defer.
    fn decide(&self, ctx: &DecisionContext, params: &serde_json::Value) -> Decision {
        match self.evaluate_blob(ctx, params) {
            Ok(decision) => decision,
            Err(err) => {
                let fallback = fail_safe(ctx.my_tokens);
                tracing::warn!(
                    policy = self.name(),
                    error = %err,
                    fallback = ?fallback,
                    "policy failed, using fail-safe"
                );
                fallback
            }
        }
    }
}

pub fn fail_safe(tokens: u32) -> Decision {
    if tokens == 0 {
        Decision::Take
    } else {
        Decision::Defer
    }
}

/// Factory for policies by name.
///
/// Knows `"tiered"` and `"baseline"`. Unknown names fall back to the tiered
/// policy with a warning.
///
/// ```rust
/// use nothanks_ai::create_policy;
///
/// assert_eq!(create_policy("baseline").name(), "BaselinePolicy");
/// assert_eq!(create_policy("mystery").name(), "TieredPolicy");
/// ```
pub fn create_policy(name: &str) -> Box<dyn DecisionPolicy> {
    match name {
        "tiered" => Box::new(policy::TieredPolicy::new()),
        "baseline" => Box::new(policy::BaselinePolicy::new()),
        other => {
            tracing::warn!(requested = other, "unknown policy, using tiered");
            Box::new(policy::TieredPolicy::new())
        }
    }
}

/// Observes `game` from `player_id`'s seat and decides, never failing.
pub fn decide_for(policy: &dyn DecisionPolicy, game: &GameSession, player_id: &str) -> Decision {
    let params = game
        .player(player_id)
        .and_then(|p| p.policy_params().cloned())
        .unwrap_or(serde_json::Value::Null);
    match DecisionContext::observe(game, player_id) {
        Ok(ctx) => policy.decide(&ctx, &params),
        Err(err) => {
            let tokens = game.player(player_id).map_or(1, |p| p.tokens());
            let fallback = fail_safe(tokens);
            tracing::warn!(player_id, error = %err, fallback = ?fallback, "cannot observe seat");
            fallback
        }
    }
}
