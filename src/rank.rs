//! Rank tiers keyed by accumulated demonic power, and the pass/fail rule.

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTier {
    pub min_score: u64,
    pub name: String,
    /// CSS class the renderer applies to the rank label.
    pub style_tag: String,
}

impl RankTier {
    pub fn new(min_score: u64, name: &str, style_tag: &str) -> Self {
        Self { min_score, name: name.to_string(), style_tag: style_tag.to_string() }
    }
}

/// Tiers kept in descending `min_score` order. Always contains a zero tier,
/// so every score maps to some rank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RankTier>", into = "Vec<RankTier>")]
pub struct RankTable {
    tiers: Vec<RankTier>,
}

impl RankTable {
    pub fn new(mut tiers: Vec<RankTier>) -> Result<Self, QuizError> {
        if !tiers.iter().any(|t| t.min_score == 0) {
            return Err(QuizError::format("ranks", "must contain a tier with min_score 0"));
        }
        if let Some(t) = tiers.iter().find(|t| t.name.trim().is_empty()) {
            return Err(QuizError::format(
                "ranks",
                format!("tier at {} has an empty name", t.min_score),
            ));
        }
        tiers.sort_by(|a, b| b.min_score.cmp(&a.min_score));
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    /// Greatest tier whose threshold does not exceed `score`.
    pub fn rank_for(&self, score: u64) -> &RankTier {
        self.tiers
            .iter()
            .find(|t| t.min_score <= score)
            // the zero tier sorts last and matches everything
            .unwrap_or(&self.tiers[self.tiers.len() - 1])
    }

    /// Position of a tier name in ascending order (0 = lowest). Unknown names
    /// rank below everything.
    pub fn standing(&self, name: &str) -> Option<usize> {
        self.tiers
            .iter()
            .rev()
            .position(|t| t.name == name)
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                RankTier::new(8000, "Ultimate-Class Devil", "rank-ultimate"),
                RankTier::new(4000, "High-Class Devil", "rank-high"),
                RankTier::new(1500, "Middle-Class Devil", "rank-middle"),
                RankTier::new(0, "Lower-Class Devil", "rank-low"),
            ],
        }
    }
}

impl TryFrom<Vec<RankTier>> for RankTable {
    type Error = QuizError;

    fn try_from(tiers: Vec<RankTier>) -> Result<Self, Self::Error> {
        RankTable::new(tiers)
    }
}

impl From<RankTable> for Vec<RankTier> {
    fn from(table: RankTable) -> Self {
        table.tiers
    }
}

/// Convenience wrapper over [`RankTable::rank_for`].
pub fn rank_for(table: &RankTable, score: u64) -> &RankTier {
    table.rank_for(score)
}

pub fn has_passed(final_score_percent: f64, passing_threshold: f64) -> bool {
    final_score_percent >= passing_threshold
}
