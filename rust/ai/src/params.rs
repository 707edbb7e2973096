//! Per-bot parameters and difficulty profiles.
//!
//! Parameters travel through the engine as an opaque JSON blob on the
//! player's seat; only this crate knows their shape.

use serde::{Deserialize, Serialize};

use crate::PolicyError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn profile(self) -> TierProfile {
        match self {
            Difficulty::Easy => EASY,
            Difficulty::Medium => MEDIUM,
            Difficulty::Hard => HARD,
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(PolicyError::MalformedParams(format!(
                "unknown difficulty `{other}`"
            ))),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which opponent, if any, the policy avoids feeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tracking {
    /// The visible score leader
    #[default]
    Leader,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyParams {
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Seeds the bounded noise draw
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub tracking: Tracking,
}

impl PolicyParams {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            seed,
            tracking: Tracking::default(),
        }
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self, PolicyError> {
        serde_json::from_value(value.clone())
            .map_err(|e| PolicyError::MalformedParams(e.to_string()))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "difficulty": self.difficulty,
            "seed": self.seed,
            "tracking": self.tracking,
        })
    }
}

/// Tuning for one difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierProfile {
    /// Net cost tolerated at the start of the round with a full stash
    pub base_tolerance: f64,
    /// Growth of tolerance as the round progresses
    pub progress_weight: f64,
    /// Spread between leading (less) and trailing (more) tolerance
    pub rank_weight: f64,
    /// Fraction of tolerance left when the stash is empty
    pub scarcity_floor: f64,
    /// Threshold bonus per opponent holding a neighbour of the card
    pub contest_weight: f64,
    /// Threshold penalty when the card mostly helps the tracked opponent
    pub tracking_weight: f64,
    /// Noise amplitude as a fraction of the tolerance
    pub noise_fraction: f64,
}

pub const EASY: TierProfile = TierProfile {
    base_tolerance: 5.0,
    progress_weight: 0.3,
    rank_weight: 0.0,
    scarcity_floor: 0.6,
    contest_weight: 0.0,
    tracking_weight: 0.0,
    noise_fraction: 0.25,
};

pub const MEDIUM: TierProfile = TierProfile {
    base_tolerance: 7.0,
    progress_weight: 0.5,
    rank_weight: 0.2,
    scarcity_floor: 0.4,
    contest_weight: 1.5,
    tracking_weight: 0.0,
    noise_fraction: 0.15,
};

pub const HARD: TierProfile = TierProfile {
    base_tolerance: 8.0,
    progress_weight: 0.6,
    rank_weight: 0.3,
    scarcity_floor: 0.3,
    contest_weight: 2.0,
    tracking_weight: 2.5,
    noise_fraction: 0.05,
};
