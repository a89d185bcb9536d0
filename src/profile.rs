//! Cross-session player profile (high score, best rank, category history)
//! and the key-value store it is persisted to.
//!
//! Storage failures are never fatal: loading falls back to an empty profile
//! and saving logs a warning and moves on.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::StorageKeys;
use crate::error::QuizError;
use crate::rank::RankTable;
use crate::state::CategoryTally;

/// Minimal string key-value capability (localStorage in the browser).
pub trait ProfileStore {
    fn read(&self, key: &str) -> Result<Option<String>, QuizError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), QuizError>;
}

/// In-memory store for tests and for running without browser storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// When set, every operation fails as if storage were disabled.
    pub unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self { entries: HashMap::new(), unavailable: true }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl ProfileStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, QuizError> {
        if self.unavailable {
            return Err(QuizError::StorageUnavailable("memory store disabled".into()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), QuizError> {
        if self.unavailable {
            return Err(QuizError::StorageUnavailable("memory store disabled".into()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Profile {
    pub high_score: u64,
    pub best_rank: Option<String>,
    pub category_history: BTreeMap<String, CategoryTally>,
}

/// What changed when a finished session was folded into the profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub new_high_score: bool,
    pub new_best_rank: bool,
}

impl Profile {
    /// Read the profile, treating unavailable storage or garbled entries as
    /// "nothing saved yet".
    pub fn load(store: &dyn ProfileStore, keys: &StorageKeys) -> Self {
        match Self::try_load(store, keys) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("profile not loaded, starting fresh: {e}");
                Profile::default()
            }
        }
    }

    fn try_load(store: &dyn ProfileStore, keys: &StorageKeys) -> Result<Self, QuizError> {
        let high_score = match store.read(&keys.high_score)? {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                log::warn!("ignoring malformed high score {raw:?}");
                0
            }),
            None => 0,
        };
        let best_rank = store
            .read(&keys.best_rank)?
            .filter(|s| !s.trim().is_empty());
        let category_history = match store.read(&keys.category_history)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("ignoring malformed category history: {e}");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        Ok(Self { high_score, best_rank, category_history })
    }

    /// Write all entries. Errors are reported to the caller, who normally
    /// just logs them (see [`Profile::save_or_warn`]).
    pub fn save(&self, store: &mut dyn ProfileStore, keys: &StorageKeys) -> Result<(), QuizError> {
        store.write(&keys.high_score, &self.high_score.to_string())?;
        if let Some(rank) = &self.best_rank {
            store.write(&keys.best_rank, rank)?;
        }
        let history = serde_json::to_string(&self.category_history)
            .map_err(|e| QuizError::StorageUnavailable(e.to_string()))?;
        store.write(&keys.category_history, &history)?;
        Ok(())
    }

    pub fn save_or_warn(&self, store: &mut dyn ProfileStore, keys: &StorageKeys) {
        if let Err(e) = self.save(store, keys) {
            log::warn!("profile not saved: {e}");
        }
    }

    /// Fold a finished session in. The best rank is compared by tier order in
    /// `ranks`, so a renamed or unknown stored rank is always replaced.
    pub fn record_session(
        &mut self,
        score: u64,
        rank_name: &str,
        ranks: &RankTable,
        tally: &BTreeMap<String, CategoryTally>,
    ) -> ProfileUpdate {
        let new_high_score = score > self.high_score;
        if new_high_score {
            self.high_score = score;
        }
        let current = self.best_rank.as_deref().and_then(|r| ranks.standing(r));
        let candidate = ranks.standing(rank_name);
        let new_best_rank = candidate.is_some() && candidate > current;
        if new_best_rank {
            self.best_rank = Some(rank_name.to_string());
        }
        for (category, t) in tally {
            self.category_history.entry(category.clone()).or_default().merge(*t);
        }
        ProfileUpdate { new_high_score, new_best_rank }
    }

    /// Categories sorted weakest first (by historical accuracy, then name).
    pub fn weakest_categories(&self) -> Vec<(&str, CategoryTally)> {
        let mut v: Vec<(&str, CategoryTally)> = self
            .category_history
            .iter()
            .filter(|(_, t)| t.total > 0)
            .map(|(k, t)| (k.as_str(), *t))
            .collect();
        v.sort_by(|a, b| {
            a.1.accuracy_percent()
                .total_cmp(&b.1.accuracy_percent())
                .then_with(|| a.0.cmp(b.0))
        });
        v
    }
}
