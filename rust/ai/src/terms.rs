//! Independent terms the tiered policy combines.
//!
//! Each term is a pure function of its inputs so it can be tested alone.

use std::collections::BTreeSet;

use nothanks_engine::cards::Card;
use nothanks_engine::scoring::score;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::params::TierProfile;

/// Tokens at which the stash stops limiting tolerance.
pub const SCARCITY_HORIZON: u32 = 8;

/// Score saved by acquiring `card` compared with holding it unconnected,
/// measured with the real scorer.
///
/// Zero for a card touching no run, the card's own value when it extends a
/// run upward, and the old run head when it extends one downward. Bridging two
/// runs adds the upper run head as well.
pub fn connection_bonus(held: &BTreeSet<Card>, card: Card) -> i32 {
    let before = score(held, 0);
    let after = score(held.iter().chain(std::iter::once(&card)), 0);
    i32::from(card.value()) - (after - before)
}

/// Points a take really costs: with `bonus` from [`connection_bonus`] this is
/// `score(held + card) - score(held) - pile`, the change the scorer would
/// report for taking the card and the pile.
pub fn net_cost(card: Card, bonus: i32, pile: u32) -> i32 {
    i32::from(card.value()) - bonus - pile as i32
}

/// Net cost a player accepts given tier, round progress, standing and stash.
///
/// `relative_rank` is 0.0 for the leader and 1.0 for the last seat.
pub fn risk_tolerance(profile: &TierProfile, progress: f64, relative_rank: f64, tokens: u32) -> f64 {
    let progress_factor = 1.0 + profile.progress_weight * progress.clamp(0.0, 1.0);
    let rank_factor = 1.0 + profile.rank_weight * (2.0 * relative_rank.clamp(0.0, 1.0) - 1.0);
    let stash = f64::from(tokens.min(SCARCITY_HORIZON)) / f64::from(SCARCITY_HORIZON);
    let scarcity_factor = profile.scarcity_floor + (1.0 - profile.scarcity_floor) * stash;
    profile.base_tolerance * progress_factor * rank_factor * scarcity_factor
}

/// Opponents holding a card adjacent to `card`.
pub fn contested_by<'a>(card: Card, others: impl IntoIterator<Item = &'a BTreeSet<Card>>) -> usize {
    others
        .into_iter()
        .filter(|held| held.iter().any(|c| c.is_adjacent(card)))
        .count()
}

/// True when `card` is worth more to the tracked opponent than to me.
pub fn benefits_tracked(card: Card, mine: &BTreeSet<Card>, tracked: &BTreeSet<Card>) -> bool {
    let theirs = connection_bonus(tracked, card);
    theirs > 0 && theirs > connection_bonus(mine, card)
}

/// Threshold shift from the other seats: positive favours taking.
pub fn competition(profile: &TierProfile, contested: usize, feeds_tracked: bool) -> f64 {
    let contest = profile.contest_weight * contested.min(2) as f64;
    let tracking = if feeds_tracked { profile.tracking_weight } else { 0.0 };
    contest - tracking
}

/// Bounded perturbation, uniform in `±noise_fraction * tolerance`.
///
/// Seeded from the bot's seed and the situation, so the same inputs always
/// produce the same value.
pub fn noise(profile: &TierProfile, tolerance: f64, seed: u64, situation: u64) -> f64 {
    let amplitude = (profile.noise_fraction * tolerance).abs();
    if amplitude == 0.0 || !amplitude.is_finite() {
        return 0.0;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(mix(seed, situation));
    rng.random_range(-amplitude..=amplitude)
}

/// Packs the observable situation into one word for seeding.
pub fn situation_key(card: Card, pile: u32, deck_size: usize, my_tokens: u32) -> u64 {
    u64::from(card.value())
        | (u64::from(pile) << 8)
        | ((deck_size as u64) << 24)
        | (u64::from(my_tokens) << 32)
}

fn mix(seed: u64, situation: u64) -> u64 {
    // splitmix64 finaliser
    let mut z = seed ^ situation.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
