use crate::cards::Card;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type PlayerId = String;

/// The two things a player can do on their turn.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    /// Place one token on the pile and hand the card to the next player
    Pass,
    /// Take the face-up card and every token on it
    Take,
}

/// A seated participant with their token stash and collected cards.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    name: String,
    tokens: u32,
    held: BTreeSet<Card>,
    /// Join order, used to break ranking ties
    joined_seq: u64,
    /// Opaque decision-policy parameters; present only for computer players
    policy_params: Option<serde_json::Value>,
}

impl Player {
    pub fn human(id: impl Into<PlayerId>, name: impl Into<String>, joined_seq: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tokens: 0,
            held: BTreeSet::new(),
            joined_seq,
            policy_params: None,
        }
    }

    pub fn computer(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        joined_seq: u64,
        policy_params: serde_json::Value,
    ) -> Self {
        Self {
            policy_params: Some(policy_params),
            ..Self::human(id, name, joined_seq)
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn tokens(&self) -> u32 {
        self.tokens
    }
    pub fn held(&self) -> &BTreeSet<Card> {
        &self.held
    }
    pub fn joined_seq(&self) -> u64 {
        self.joined_seq
    }

    pub fn is_computer(&self) -> bool {
        self.policy_params.is_some()
    }

    pub fn policy_params(&self) -> Option<&serde_json::Value> {
        self.policy_params.as_ref()
    }

    /// Removes one token. Returns false, leaving the count at zero, when there is none.
    pub fn spend_token(&mut self) -> bool {
        match self.tokens.checked_sub(1) {
            Some(left) => {
                self.tokens = left;
                true
            }
            None => false,
        }
    }

    pub fn add_tokens(&mut self, amount: u32) {
        self.tokens = self.tokens.saturating_add(amount);
    }

    pub fn collect(&mut self, card: Card) {
        self.held.insert(card);
    }

    /// Prepares the player for a fresh round.
    pub fn reset_for_round(&mut self, tokens: u32) {
        self.tokens = tokens;
        self.held.clear();
    }

    /// Hands back the collected cards, leaving the player with none.
    pub fn surrender_cards(&mut self) -> BTreeSet<Card> {
        std::mem::take(&mut self.held)
    }
}
