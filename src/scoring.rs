//! Answer scoring with the combo bonus.

use serde::Serialize;

use crate::config::ScoringConfig;
use crate::state::ProgressionState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    pub is_correct: bool,
    pub points: u64,
    pub explanation: String,
    /// `None` only for the neutral result (nothing to score).
    pub correct_index: Option<usize>,
    pub category: String,
    pub streak_after: u32,
    /// Whether the answer was applied to the state at all.
    pub recorded: bool,
}

impl AnswerResult {
    fn neutral(streak: u32) -> Self {
        Self {
            is_correct: false,
            points: 0,
            explanation: String::new(),
            correct_index: None,
            category: String::new(),
            streak_after: streak,
            recorded: false,
        }
    }
}

/// Points a correct answer would earn right now. The combo is judged on the
/// streak entering the question, before this answer is counted.
pub fn points_for_correct(state: &ProgressionState, scoring: &ScoringConfig) -> u64 {
    if state.is_combo_active(scoring.combo_threshold) {
        scoring.base_points.saturating_mul(scoring.combo_multiplier)
    } else {
        scoring.base_points
    }
}

/// Score `choice` against the current question. `None` is the time-out
/// sentinel and always counts as wrong.
///
/// With no current question, or one that was already answered, this returns
/// a neutral result and leaves `state` untouched.
pub fn process_answer(
    state: &mut ProgressionState,
    scoring: &ScoringConfig,
    choice: Option<usize>,
) -> AnswerResult {
    let Some(question) = state.current_question() else {
        log::debug!("answer submitted with no current question");
        return AnswerResult::neutral(state.streak());
    };
    let is_correct = choice == Some(question.answer_index);
    let correct_index = question.answer_index;
    let explanation = question.explanation.clone();
    let category = question.category.clone();

    if !state.mark_answered() {
        log::debug!("question {} already answered, ignoring", state.current_index() + 1);
        return AnswerResult::neutral(state.streak());
    }

    let points = if is_correct {
        let points = points_for_correct(state, scoring);
        state.record_correct(points);
        points
    } else {
        state.record_incorrect();
        0
    };

    AnswerResult {
        is_correct,
        points,
        explanation,
        correct_index: Some(correct_index),
        category,
        streak_after: state.streak(),
        recorded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{Question, QuestionBank};
    use crate::state::Mode;

    fn state(n: usize) -> ProgressionState {
        let questions = (0..n)
            .map(|i| Question {
                text: format!("Q{i}"),
                options: vec!["a".into(), "b".into(), "c".into()],
                answer_index: 2,
                explanation: format!("because {i}"),
                category: "Airspace".into(),
                mentor_image_key: "m.png".into(),
            })
            .collect();
        ProgressionState::new(QuestionBank::new(questions).unwrap(), Mode::Standard)
    }

    #[test]
    fn combo_applies_after_threshold_is_reached() {
        let cfg = ScoringConfig { base_points: 100, combo_multiplier: 2, combo_threshold: 3 };
        let mut st = state(5);
        let mut points = Vec::new();
        for _ in 0..4 {
            points.push(process_answer(&mut st, &cfg, Some(2)).points);
            st.advance();
        }
        assert_eq!(points, vec![100, 100, 100, 200]);
        assert_eq!(st.score(), 500);
    }

    #[test]
    fn wrong_answer_breaks_streak_and_combo() {
        let cfg = ScoringConfig::default();
        let mut st = state(6);
        for _ in 0..3 {
            process_answer(&mut st, &cfg, Some(2));
            st.advance();
        }
        let miss = process_answer(&mut st, &cfg, Some(0));
        assert!(!miss.is_correct);
        assert_eq!(miss.points, 0);
        assert_eq!(miss.streak_after, 0);
        assert_eq!(miss.correct_index, Some(2));
        st.advance();
        assert_eq!(process_answer(&mut st, &cfg, Some(2)).points, 100);
        assert_eq!(st.max_streak(), 3);
    }

    #[test]
    fn result_carries_question_details() {
        let mut st = state(1);
        let r = process_answer(&mut st, &ScoringConfig::default(), Some(2));
        assert!(r.is_correct && r.recorded);
        assert_eq!(r.explanation, "because 0");
        assert_eq!(r.category, "Airspace");
        assert_eq!(r.streak_after, 1);
    }

    #[test]
    fn timeout_sentinel_is_incorrect() {
        let mut st = state(1);
        let r = process_answer(&mut st, &ScoringConfig::default(), None);
        assert!(!r.is_correct);
        assert!(r.recorded);
    }

    #[test]
    fn no_current_question_is_neutral() {
        let mut st = state(1);
        st.advance();
        let r = process_answer(&mut st, &ScoringConfig::default(), Some(2));
        assert!(!r.recorded);
        assert_eq!(r.points, 0);
        assert_eq!(st.score(), 0);
        assert_eq!(st.correct_count(), 0);
    }

    #[test]
    fn double_submit_is_ignored() {
        let mut st = state(2);
        let cfg = ScoringConfig::default();
        assert!(process_answer(&mut st, &cfg, Some(2)).recorded);
        let again = process_answer(&mut st, &cfg, Some(2));
        assert!(!again.recorded);
        assert_eq!(st.correct_count(), 1);
        assert_eq!(st.score(), 100);
    }
}
