//! Game configuration: scoring constants, rank tiers, rules and storage keys.
//!
//! Every field has a default matching the shipped game, so the host page only
//! needs to pass the values it wants to override (as a JSON object) to
//! [`GameConfig::from_json`].

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::rank::RankTable;

/// Mentor portrait shown when a question does not name one.
pub const DEFAULT_MENTOR: &str = "rias_neutral.png";
/// Category assigned to questions that do not name one.
pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_points: u64,
    pub combo_multiplier: u64,
    /// Consecutive correct answers needed before the multiplier applies.
    pub combo_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { base_points: 100, combo_multiplier: 2, combo_threshold: 3 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Minimum final percentage that counts as a pass.
    pub passing_score: f64,
    pub data_path: String,
    /// Countdown budget per question in timed mode (seconds).
    pub question_time_secs: u32,
    /// How many times the browser loader fetches the bank before giving up.
    pub max_load_attempts: u32,
    pub shuffle: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            passing_score: 70.0,
            data_path: "data/questions.json".to_string(),
            question_time_secs: 30,
            max_load_attempts: 3,
            shuffle: true,
        }
    }
}

/// Extra points for answering quickly in timed mode.
///
/// Awarded only for correct answers and never while the clock reads zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeBonusPolicy {
    None,
    /// `points` for every whole second left on the clock.
    PerSecond { points: u64 },
    /// Flat `points` while at least `min_remaining` seconds are left.
    Flat { points: u64, min_remaining: u32 },
}

impl Default for TimeBonusPolicy {
    fn default() -> Self {
        TimeBonusPolicy::PerSecond { points: 10 }
    }
}

impl TimeBonusPolicy {
    pub fn bonus(&self, remaining_secs: u32, is_correct: bool) -> u64 {
        if !is_correct || remaining_secs == 0 {
            return 0;
        }
        match *self {
            TimeBonusPolicy::None => 0,
            TimeBonusPolicy::PerSecond { points } => points.saturating_mul(remaining_secs as u64),
            TimeBonusPolicy::Flat { points, min_remaining } => {
                if remaining_secs >= min_remaining.max(1) { points } else { 0 }
            }
        }
    }
}

/// Versioned localStorage keys for the persisted profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub high_score: String,
    pub best_rank: String,
    pub category_history: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            high_score: "dxd_academy.v2.high_score".to_string(),
            best_rank: "dxd_academy.v2.best_rank".to_string(),
            category_history: "dxd_academy.v2.category_history".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub scoring: ScoringConfig,
    pub ranks: RankTable,
    pub rules: RulesConfig,
    pub time_bonus: TimeBonusPolicy,
    /// Prefix joined with a question's mentor key to form the portrait URL.
    pub assets_path: String,
    pub storage: StorageKeys,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            ranks: RankTable::default(),
            rules: RulesConfig::default(),
            time_bonus: TimeBonusPolicy::default(),
            assets_path: "assets/images/".to_string(),
            storage: StorageKeys::default(),
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON override and validate the result.
    pub fn from_json(text: &str) -> Result<Self, QuizError> {
        let cfg: GameConfig = serde_json::from_str(text)
            .map_err(|e| QuizError::format("config", e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        if self.scoring.base_points == 0 {
            return Err(QuizError::format("scoring.base_points", "must be positive"));
        }
        if self.scoring.combo_multiplier == 0 {
            return Err(QuizError::format("scoring.combo_multiplier", "must be positive"));
        }
        if !(0.0..=100.0).contains(&self.rules.passing_score) {
            return Err(QuizError::format("rules.passing_score", "must be within 0..=100"));
        }
        if self.rules.question_time_secs == 0 {
            return Err(QuizError::format("rules.question_time_secs", "must be positive"));
        }
        if self.rules.max_load_attempts == 0 {
            return Err(QuizError::format("rules.max_load_attempts", "must be at least 1"));
        }
        Ok(())
    }
}
