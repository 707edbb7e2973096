//! Public projection of a session.
//!
//! Snapshots never carry the removed cards or the undrawn order. Fields that
//! a transport should hide from non-owners are listed in `redactable`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::game::{GameSession, Phase};
use crate::player::PlayerId;
use crate::scoring::score;
use crate::settings::GameSettings;

pub const REDACT_TOKEN_COUNT: &str = "players[].tokenCount";
pub const REDACT_SCORE: &str = "players[].score";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub token_count: u32,
    pub held_cards: Vec<Card>,
    pub is_bot: bool,
    /// Live score, present only when the table shows real-time scores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSnapshot {
    pub players: Vec<PlayerView>,
    pub current_card: Option<Card>,
    pub tokens_on_pile: u32,
    pub current_player_id: Option<PlayerId>,
    pub deck_size: usize,
    pub removed_count: usize,
    pub started: bool,
    pub phase: Phase,
    pub host_id: Option<PlayerId>,
    pub settings: GameSettings,
    pub turn_started_at: Option<DateTime<Utc>>,
    pub turn_generation: u64,
    /// Paths of per-player fields that belong only to their owner
    #[serde(default)]
    pub redactable: Vec<String>,
}

impl PublicSnapshot {
    pub fn of(game: &GameSession) -> Self {
        let settings = *game.settings();
        let players = game
            .players()
            .iter()
            .map(|p| PlayerView {
                id: p.id().clone(),
                name: p.name().to_string(),
                token_count: p.tokens(),
                held_cards: p.held().iter().copied().collect(),
                is_bot: p.is_computer(),
                score: settings
                    .show_real_time_score
                    .then(|| score(p.held(), p.tokens())),
            })
            .collect();

        let mut redactable = Vec::new();
        if !settings.show_opponent_tokens {
            redactable.push(REDACT_TOKEN_COUNT.to_string());
            // the score leaks the token count
            if settings.show_real_time_score {
                redactable.push(REDACT_SCORE.to_string());
            }
        }

        let pile = game.pile();
        Self {
            players,
            current_card: pile.current_card,
            tokens_on_pile: pile.tokens,
            current_player_id: game.current_player_id().cloned(),
            deck_size: game.deck_size(),
            removed_count: game.removed_count(),
            started: game.is_started(),
            phase: game.phase(),
            host_id: game.host_id().cloned(),
            settings,
            turn_started_at: game.turn_started_at(),
            turn_generation: game.turn_generation(),
            redactable,
        }
    }

    /// Copy as seen by `viewer`: redactable fields of other players are blanked.
    pub fn redacted_for(&self, viewer: &str) -> Self {
        let mut view = self.clone();
        let hide_tokens = self.redactable.iter().any(|r| r == REDACT_TOKEN_COUNT);
        let hide_score = self.redactable.iter().any(|r| r == REDACT_SCORE);
        for p in view.players.iter_mut().filter(|p| p.id != viewer) {
            if hide_tokens {
                p.token_count = 0;
            }
            if hide_score {
                p.score = None;
            }
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsPatch;

    fn started(patch: SettingsPatch) -> GameSession {
        let mut g = GameSession::new(Some(5));
        g.add_player("a", "Ann").unwrap();
        g.add_player("b", "Bob").unwrap();
        g.start(Some(&patch)).unwrap();
        g
    }

    #[test]
    fn snapshot_reflects_round_state() {
        let g = started(SettingsPatch::default());
        let snap = PublicSnapshot::of(&g);
        assert!(snap.started);
        assert_eq!(snap.removed_count, 9);
        assert_eq!(snap.deck_size, 23);
        assert!(snap.current_card.is_some());
        assert_eq!(snap.current_player_id.as_ref(), g.current_player_id());
        assert_eq!(snap.players[0].token_count, 11);
    }

    #[test]
    fn hidden_tokens_are_marked_redactable() {
        let snap = PublicSnapshot::of(&started(SettingsPatch::default()));
        assert!(snap.redactable.contains(&REDACT_TOKEN_COUNT.to_string()));
        assert!(snap.redactable.contains(&REDACT_SCORE.to_string()));

        let view = snap.redacted_for("a");
        let own = view.players.iter().find(|p| p.id == "a").unwrap();
        let other = view.players.iter().find(|p| p.id == "b").unwrap();
        assert_eq!(own.token_count, 11);
        assert_eq!(other.token_count, 0);
        assert!(other.score.is_none());
    }

    #[test]
    fn open_tokens_need_no_redaction() {
        let snap = PublicSnapshot::of(&started(SettingsPatch {
            show_opponent_tokens: Some(true),
            show_real_time_score: Some(false),
            ..Default::default()
        }));
        assert!(snap.redactable.is_empty());
        assert!(snap.players.iter().all(|p| p.score.is_none()));
    }

    #[test]
    fn serializes_camel_case_without_hidden_cards() {
        let snap = PublicSnapshot::of(&started(SettingsPatch::default()));
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"tokensOnPile\":0"));
        assert!(json.contains("\"turnGeneration\""));
        assert!(!json.contains("undrawn"));
    }
}
