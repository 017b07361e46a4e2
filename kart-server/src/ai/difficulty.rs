// src/ai/difficulty.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub speed_multiplier: f32,     // scales the standard kart stats
    pub turn_accuracy: f32,        // 0..1, fraction of the true angle acted on
    pub reaction_time: f32,        // s, lag of the perceived target angle
    pub item_use_probability: f32, // per item decision
    pub mistake_rate: f32,         // mistakes per second
    pub rubber_band_per_rank: f32, // target-speed fraction per rank
    pub rubber_band_bonus_clamp: f32,
    pub rubber_band_penalty_clamp: f32,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                speed_multiplier: 0.9,
                turn_accuracy: 0.75,
                reaction_time: 0.35,
                item_use_probability: 0.35,
                mistake_rate: 0.25,
                rubber_band_per_rank: 0.04,
                rubber_band_bonus_clamp: 0.3,
                rubber_band_penalty_clamp: 0.15,
            },
            Difficulty::Normal => DifficultyProfile {
                speed_multiplier: 1.0,
                turn_accuracy: 0.88,
                reaction_time: 0.2,
                item_use_probability: 0.55,
                mistake_rate: 0.1,
                rubber_band_per_rank: 0.04,
                rubber_band_bonus_clamp: 0.3,
                rubber_band_penalty_clamp: 0.1,
            },
            Difficulty::Hard => DifficultyProfile {
                speed_multiplier: 1.05,
                turn_accuracy: 0.97,
                reaction_time: 0.1,
                item_use_probability: 0.8,
                mistake_rate: 0.02,
                rubber_band_per_rank: 0.03,
                rubber_band_bonus_clamp: 0.2,
                rubber_band_penalty_clamp: 0.05,
            },
        }
    }
}

/// Target-speed adjustment for an AI `ranks_behind` places behind the best
/// human (negative when ahead). Clamped to the profile's band.
pub fn rubber_band(profile: &DifficultyProfile, ranks_behind: i32) -> f32 {
    (ranks_behind as f32 * profile.rubber_band_per_rank)
        .clamp(-profile.rubber_band_penalty_clamp, profile.rubber_band_bonus_clamp)
}
