use std::collections::BTreeSet;

use nothanks_engine::cards::{CARD_COUNT, Card};
use nothanks_engine::game::GameSession;
use nothanks_engine::player::PlayerId;
use nothanks_engine::scoring::score;

use crate::PolicyError;

/// What the deciding player may know about another seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentView {
    pub id: PlayerId,
    pub held: BTreeSet<Card>,
    /// `None` when the table hides opponents' stashes
    pub tokens: Option<u32>,
}

/// Read-only view handed to a policy for one decision.
///
/// Built by [`DecisionContext::observe`], which copies only public state:
/// opponents' token counts are dropped unless the table shows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionContext {
    pub current_card: Option<Card>,
    pub tokens_on_pile: u32,
    pub deck_size: usize,
    pub removed_count: usize,
    pub my_tokens: u32,
    pub my_held: BTreeSet<Card>,
    pub opponents: Vec<OpponentView>,
}

impl DecisionContext {
    pub fn observe(game: &GameSession, player_id: &str) -> Result<Self, PolicyError> {
        let me = game
            .player(player_id)
            .ok_or_else(|| PolicyError::SeatNotFound(player_id.to_string()))?;
        let show_tokens = game.settings().show_opponent_tokens;
        let opponents = game
            .players()
            .iter()
            .filter(|p| p.id() != player_id)
            .map(|p| OpponentView {
                id: p.id().clone(),
                held: p.held().clone(),
                tokens: show_tokens.then(|| p.tokens()),
            })
            .collect();

        let pile = game.pile();
        Ok(Self {
            current_card: pile.current_card,
            tokens_on_pile: pile.tokens,
            deck_size: game.deck_size(),
            removed_count: game.removed_count(),
            my_tokens: me.tokens(),
            my_held: me.held().clone(),
            opponents,
        })
    }

    /// Fraction of the playable cards already resolved, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let playable = CARD_COUNT.saturating_sub(self.removed_count);
        if playable == 0 {
            return 1.0;
        }
        let face_up = usize::from(self.current_card.is_some());
        let played = playable.saturating_sub(self.deck_size + face_up);
        (played as f64 / playable as f64).clamp(0.0, 1.0)
    }

    fn tokens_visible(&self) -> bool {
        self.opponents.iter().all(|o| o.tokens.is_some())
    }

    /// My score on the same basis I can see for everyone else.
    fn my_visible_score(&self) -> i32 {
        let tokens = if self.tokens_visible() { self.my_tokens } else { 0 };
        score(&self.my_held, tokens)
    }

    /// Position among all seats by visible score: 0.0 leading, 1.0 trailing.
    pub fn relative_rank(&self) -> f64 {
        if self.opponents.is_empty() {
            return 0.0;
        }
        let mine = self.my_visible_score();
        let ahead = self
            .opponents
            .iter()
            .filter(|o| visible_score(o) < mine)
            .count();
        ahead as f64 / self.opponents.len() as f64
    }

    /// The opponent with the lowest visible score, if they lead me.
    pub fn leader(&self) -> Option<&OpponentView> {
        let mine = self.my_visible_score();
        self.opponents
            .iter()
            .min_by_key(|o| visible_score(o))
            .filter(|o| visible_score(o) < mine)
    }
}

/// Score as far as it can be seen: hidden stashes count as zero.
pub fn visible_score(view: &OpponentView) -> i32 {
    score(&view.held, view.tokens.unwrap_or(0))
}
