use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const REMOVED_COUNT_RANGE: RangeInclusive<u8> = 0..=24;
pub const INITIAL_TOKENS_RANGE: RangeInclusive<u32> = 0..=55;
pub const TURN_TIME_LIMIT_RANGE: RangeInclusive<u32> = 0..=300;

/// Per-game rules, sealed when the round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Cards set aside face-down before play (0-24)
    pub removed_count: u8,
    /// Tokens dealt to every player at the start (0-55)
    pub initial_tokens: u32,
    /// Seconds a human gets per turn, 0 disables the timer (0-300)
    pub turn_time_limit_seconds: u32,
    /// Whether opponents' token counts are public
    pub show_opponent_tokens: bool,
    /// Whether live scores appear in snapshots
    pub show_real_time_score: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            removed_count: 9,
            initial_tokens: 11,
            turn_time_limit_seconds: 30,
            show_opponent_tokens: false,
            show_real_time_score: true,
        }
    }
}

impl GameSettings {
    /// Applies every present field, clamping each into its valid range.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.removed_count {
            self.removed_count = clamp(v, &REMOVED_COUNT_RANGE);
        }
        if let Some(v) = patch.initial_tokens {
            self.initial_tokens = clamp(v, &INITIAL_TOKENS_RANGE);
        }
        if let Some(v) = patch.turn_time_limit_seconds {
            self.turn_time_limit_seconds = clamp(v, &TURN_TIME_LIMIT_RANGE);
        }
        if let Some(v) = patch.show_opponent_tokens {
            self.show_opponent_tokens = v;
        }
        if let Some(v) = patch.show_real_time_score {
            self.show_real_time_score = v;
        }
    }

    pub fn turn_timer_enabled(&self) -> bool {
        self.turn_time_limit_seconds > 0
    }
}

/// Partial settings update; absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_time_limit_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_opponent_tokens: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_real_time_score: Option<bool>,
}

impl From<GameSettings> for SettingsPatch {
    fn from(s: GameSettings) -> Self {
        Self {
            removed_count: Some(s.removed_count),
            initial_tokens: Some(s.initial_tokens),
            turn_time_limit_seconds: Some(s.turn_time_limit_seconds),
            show_opponent_tokens: Some(s.show_opponent_tokens),
            show_real_time_score: Some(s.show_real_time_score),
        }
    }
}

fn clamp<T: PartialOrd + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    if value < *range.start() {
        *range.start()
    } else if value > *range.end() {
        *range.end()
    } else {
        value
    }
}
