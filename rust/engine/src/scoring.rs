//! Final scoring and ranking.
//!
//! A player's score is the sum of the lowest card of each run of consecutive
//! values they hold, minus their tokens. Lower is better.

use crate::cards::Card;
use crate::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};

/// Scores a held-card set plus a token stash.
///
/// ```
/// use nothanks_engine::cards::Card;
/// use nothanks_engine::scoring::score;
///
/// let held: Vec<Card> = [3, 4, 5, 10].iter().filter_map(|&v| Card::new(v)).collect();
/// assert_eq!(score(&held, 2), 11);
/// ```
pub fn score<'a>(held: impl IntoIterator<Item = &'a Card>, tokens: u32) -> i32 {
    let mut values: Vec<u8> = held.into_iter().map(|c| c.value()).collect();
    values.sort_unstable();
    values.dedup();

    let mut total: i32 = 0;
    let mut previous: Option<u8> = None;
    for v in values {
        let starts_run = previous.map_or(true, |p| v != p + 1);
        if starts_run {
            total += i32::from(v);
        }
        previous = Some(v);
    }
    total - tokens as i32
}

/// One line of the final table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position; sequential even when scores tie
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub score: i32,
    pub tokens: u32,
    pub cards: Vec<Card>,
}

/// Ranks players by ascending score.
///
/// The sort is stable: equal scores keep their relative input order, so the
/// caller decides the tie-break by how it orders `players`.
pub fn rank<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<Standing> {
    let mut scored: Vec<(i32, &Player)> = players
        .into_iter()
        .map(|p| (score(p.held(), p.tokens()), p))
        .collect();
    scored.sort_by_key(|(s, _)| *s);

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (s, p))| Standing {
            rank: idx + 1,
            player_id: p.id().clone(),
            name: p.name().to_string(),
            score: s,
            tokens: p.tokens(),
            cards: p.held().iter().copied().collect(),
        })
        .collect()
}
