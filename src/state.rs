//! Per-session progression: position in the bank, score, streak and
//! per-category tallies. Fields are only changed through the transition
//! methods below so the streak / count invariants always hold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::question::{Question, QuestionBank};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Standard,
    Timed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub correct: u32,
    pub total: u32,
}

impl CategoryTally {
    pub fn accuracy_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 * 100.0 / self.total as f64
    }

    pub fn merge(&mut self, other: CategoryTally) {
        self.correct = self.correct.saturating_add(other.correct);
        self.total = self.total.saturating_add(other.total);
    }
}

/// What the renderer needs to draw the current question.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionInfo {
    /// 1-based position.
    pub current: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<String>,
    pub category: String,
    pub mentor: String,
}

#[derive(Clone, Debug)]
pub struct ProgressionState {
    bank: QuestionBank,
    current_index: usize,
    answered_current: bool,
    score: u64,
    streak: u32,
    max_streak: u32,
    correct_count: u32,
    mode: Mode,
    time_remaining: u32,
    category_tally: BTreeMap<String, CategoryTally>,
}

impl ProgressionState {
    pub fn new(bank: QuestionBank, mode: Mode) -> Self {
        Self {
            bank,
            current_index: 0,
            answered_current: false,
            score: 0,
            streak: 0,
            max_streak: 0,
            correct_count: 0,
            mode,
            time_remaining: 0,
            category_tally: BTreeMap::new(),
        }
    }

    /// Start over on the same bank. The persisted profile lives elsewhere and
    /// is not touched.
    pub fn reset(&mut self, mode: Mode) {
        self.current_index = 0;
        self.answered_current = false;
        self.score = 0;
        self.streak = 0;
        self.max_streak = 0;
        self.correct_count = 0;
        self.mode = mode;
        self.time_remaining = 0;
        self.category_tally.clear();
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.bank.get(self.current_index)
    }

    pub fn question_info(&self) -> Option<QuestionInfo> {
        let q = self.current_question()?;
        Some(QuestionInfo {
            current: self.current_index + 1,
            total: self.bank.len(),
            text: q.text.clone(),
            options: q.options.clone(),
            category: q.category.clone(),
            mentor: q.mentor_image_key.clone(),
        })
    }

    /// Move to the next question. Returns whether one remains. Saturates at
    /// the end of the bank.
    pub fn advance(&mut self) -> bool {
        if self.current_index < self.bank.len() {
            self.current_index += 1;
            self.answered_current = false;
        }
        self.has_more_questions()
    }

    pub fn has_more_questions(&self) -> bool {
        self.current_index < self.bank.len()
    }

    pub fn record_correct(&mut self, points: u64) {
        self.correct_count += 1;
        self.streak += 1;
        self.max_streak = self.max_streak.max(self.streak);
        self.score = self.score.saturating_add(points);
    }

    pub fn record_incorrect(&mut self) {
        self.streak = 0;
    }

    /// Mark the current question as scored. Returns `false` if it already was
    /// (or there is no current question), in which case nothing may be recorded.
    pub(crate) fn mark_answered(&mut self) -> bool {
        if self.answered_current || !self.has_more_questions() {
            return false;
        }
        self.answered_current = true;
        true
    }

    pub fn record_time_bonus(&mut self, bonus: u64) {
        self.score = self.score.saturating_add(bonus);
    }

    pub fn record_category_result(&mut self, category: &str, is_correct: bool) {
        if category.is_empty() {
            return;
        }
        let tally = self.category_tally.entry(category.to_string()).or_default();
        tally.total += 1;
        if is_correct {
            tally.correct += 1;
        }
    }

    pub fn is_combo_active(&self, threshold: u32) -> bool {
        self.streak >= threshold
    }

    pub fn progress_percent(&self) -> f64 {
        if self.bank.is_empty() {
            return 0.0;
        }
        self.current_index as f64 * 100.0 / self.bank.len() as f64
    }

    pub fn final_score_percent(&self) -> f64 {
        if self.bank.is_empty() {
            return 0.0;
        }
        self.correct_count as f64 * 100.0 / self.bank.len() as f64
    }

    pub fn set_time_remaining(&mut self, secs: u32) {
        self.time_remaining = secs;
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_answered(&self) -> bool {
        self.answered_current
    }

    /// Questions scored so far, including the current one once answered.
    pub fn answered_count(&self) -> usize {
        self.current_index + usize::from(self.answered_current)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn category_tally(&self) -> &BTreeMap<String, CategoryTally> {
        &self.category_tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(n: usize) -> QuestionBank {
        let questions = (0..n)
            .map(|i| Question {
                text: format!("Q{i}"),
                options: vec!["a".into(), "b".into()],
                answer_index: 0,
                explanation: String::new(),
                category: "General".into(),
                mentor_image_key: "m.png".into(),
            })
            .collect();
        QuestionBank::new(questions).unwrap()
    }

    #[test]
    fn advance_reports_remaining_and_saturates() {
        let mut st = ProgressionState::new(bank(2), Mode::Standard);
        assert!(st.advance());
        assert!(!st.advance());
        assert!(!st.advance());
        assert_eq!(st.current_index(), 2);
        assert!(st.current_question().is_none());
        assert!(st.question_info().is_none());
    }

    #[test]
    fn max_streak_tracks_high_water_mark() {
        let mut st = ProgressionState::new(bank(1), Mode::Standard);
        let pattern = [true, true, false, true, true, true, false, true];
        let mut highest = 0;
        for ok in pattern {
            let before = st.max_streak();
            if ok { st.record_correct(1) } else { st.record_incorrect() }
            highest = highest.max(st.streak());
            assert!(st.max_streak() >= before);
            assert_eq!(st.max_streak(), highest);
            assert!(st.streak() <= st.max_streak());
        }
        assert_eq!(st.max_streak(), 3);
        assert_eq!(st.streak(), 1);
    }

    #[test]
    fn empty_category_is_ignored() {
        let mut st = ProgressionState::new(bank(1), Mode::Standard);
        st.record_category_result("", true);
        assert!(st.category_tally().is_empty());
        st.record_category_result("Weather", false);
        st.record_category_result("Weather", true);
        assert_eq!(st.category_tally()["Weather"], CategoryTally { correct: 1, total: 2 });
    }

    #[test]
    fn percentages() {
        let mut st = ProgressionState::new(bank(4), Mode::Standard);
        assert_eq!(st.progress_percent(), 0.0);
        st.record_correct(100);
        st.advance();
        assert_eq!(st.progress_percent(), 25.0);
        assert_eq!(st.final_score_percent(), 25.0);
    }

    #[test]
    fn reset_clears_session_fields() {
        let mut st = ProgressionState::new(bank(3), Mode::Standard);
        st.mark_answered();
        st.record_correct(100);
        st.record_category_result("General", true);
        st.advance();
        st.reset(Mode::Timed);
        assert_eq!(st.current_index(), 0);
        assert_eq!(st.score(), 0);
        assert_eq!(st.max_streak(), 0);
        assert_eq!(st.correct_count(), 0);
        assert_eq!(st.mode(), Mode::Timed);
        assert!(!st.is_answered());
        assert!(st.category_tally().is_empty());
        assert_eq!(st.bank().len(), 3);
    }

    #[test]
    fn question_cannot_be_marked_twice() {
        let mut st = ProgressionState::new(bank(1), Mode::Standard);
        assert!(st.mark_answered());
        assert!(!st.mark_answered());
        assert_eq!(st.answered_count(), 1);
        st.advance();
        assert!(!st.mark_answered());
    }
}
