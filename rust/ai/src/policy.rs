//! Tiered take/defer policy.
//!
//! The pipeline runs in order and stops at the first stage that settles the
//! decision:
//!
//! 1. forced take when the stash is empty
//! 2. take when the net cost is not positive
//! 3. compare the net cost against a threshold combined per tier from the
//!    terms in [`crate::terms`]
//!
//! Stage 3 is the only place noise enters, so it can never overturn stages 1 and 2.

use nothanks_engine::cards::Card;

use crate::context::DecisionContext;
use crate::params::{Difficulty, PolicyParams, TierProfile, Tracking};
use crate::terms::{self, connection_bonus, net_cost};
use crate::{Decision, DecisionPolicy, PolicyError};

/// Which pipeline stage settled a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ForcedTake,
    Dominant,
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    pub stage: Stage,
    pub net_cost: i32,
    /// `None` unless the threshold stage ran
    pub threshold: Option<f64>,
}

/// Inputs the tier combiners draw from.
#[derive(Debug, Clone, Copy)]
struct Terms {
    tolerance: f64,
    contested: usize,
    feeds_tracked: bool,
    noise: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TieredPolicy;

impl TieredPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        ctx: &DecisionContext,
        params: &PolicyParams,
    ) -> Result<Evaluation, PolicyError> {
        let card = ctx.current_card.ok_or(PolicyError::MissingCurrentCard)?;
        let bonus = connection_bonus(&ctx.my_held, card);
        let cost = net_cost(card, bonus, ctx.tokens_on_pile);

        if ctx.my_tokens == 0 {
            return Ok(Evaluation {
                decision: Decision::Take,
                stage: Stage::ForcedTake,
                net_cost: cost,
                threshold: None,
            });
        }
        if cost <= 0 {
            return Ok(Evaluation {
                decision: Decision::Take,
                stage: Stage::Dominant,
                net_cost: cost,
                threshold: None,
            });
        }

        let profile = params.difficulty.profile();
        let t = gather(ctx, card, &profile, params);
        let threshold = match params.difficulty {
            Difficulty::Easy => combine_easy(&t),
            Difficulty::Medium => combine_medium(&profile, &t),
            Difficulty::Hard => combine_hard(&profile, &t),
        };
        if !threshold.is_finite() {
            return Err(PolicyError::NonFinite);
        }

        let decision = if f64::from(cost) <= threshold {
            Decision::Take
        } else {
            Decision::Defer
        };
        Ok(Evaluation {
            decision,
            stage: Stage::Threshold,
            net_cost: cost,
            threshold: Some(threshold),
        })
    }
}

fn gather(ctx: &DecisionContext, card: Card, profile: &TierProfile, params: &PolicyParams) -> Terms {
    let tolerance =
        terms::risk_tolerance(profile, ctx.progress(), ctx.relative_rank(), ctx.my_tokens);
    let contested = terms::contested_by(card, ctx.opponents.iter().map(|o| &o.held));
    let feeds_tracked = match params.tracking {
        Tracking::Leader => ctx
            .leader()
            .is_some_and(|leader| terms::benefits_tracked(card, &ctx.my_held, &leader.held)),
        Tracking::None => false,
    };
    let situation = terms::situation_key(card, ctx.tokens_on_pile, ctx.deck_size, ctx.my_tokens);
    Terms {
        tolerance,
        contested,
        feeds_tracked,
        noise: terms::noise(profile, tolerance, params.seed, situation),
    }
}

/// Tolerance and noise only; ignores the other seats.
fn combine_easy(t: &Terms) -> f64 {
    t.tolerance + t.noise
}

/// Adds the pull of contested cards.
fn combine_medium(profile: &TierProfile, t: &Terms) -> f64 {
    t.tolerance + terms::competition(profile, t.contested, false) + t.noise
}

/// Full competition term, including the tracked opponent.
fn combine_hard(profile: &TierProfile, t: &Terms) -> f64 {
    t.tolerance + terms::competition(profile, t.contested, t.feeds_tracked) + t.noise
}

impl DecisionPolicy for TieredPolicy {
    fn evaluate_blob(
        &self,
        ctx: &DecisionContext,
        params: &serde_json::Value,
    ) -> Result<Decision, PolicyError> {
        let params = PolicyParams::from_value(params)?;
        self.evaluate(ctx, &params).map(|e| e.decision)
    }

    fn name(&self) -> &str {
        "TieredPolicy"
    }
}

/// Fixed-threshold reference policy for benchmarking the tiers.
///
/// Takes whenever the pile covers most of the card's net cost. Ignores
/// params, progress and opponents.
#[derive(Debug, Clone, Default)]
pub struct BaselinePolicy;

impl BaselinePolicy {
    /// Net cost accepted without a second thought.
    pub const THRESHOLD: i32 = 6;

    pub fn new() -> Self {
        Self
    }
}

impl DecisionPolicy for BaselinePolicy {
    fn evaluate_blob(
        &self,
        ctx: &DecisionContext,
        _params: &serde_json::Value,
    ) -> Result<Decision, PolicyError> {
        let card = ctx.current_card.ok_or(PolicyError::MissingCurrentCard)?;
        if ctx.my_tokens == 0 {
            return Ok(Decision::Take);
        }
        let cost = net_cost(card, connection_bonus(&ctx.my_held, card), ctx.tokens_on_pile);
        Ok(if cost <= Self::THRESHOLD {
            Decision::Take
        } else {
            Decision::Defer
        })
    }

    fn name(&self) -> &str {
        "BaselinePolicy"
    }
}
