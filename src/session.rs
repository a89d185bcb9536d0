//! One play-through of the bank: ties progression state, scoring, the
//! countdown and the persisted profile together, and turns every transition
//! into a record the renderer can draw.

use serde::Serialize;

use crate::config::GameConfig;
use crate::profile::{Profile, ProfileUpdate};
use crate::question::QuestionBank;
use crate::rank::{has_passed, RankTier};
use crate::scoring::{process_answer, AnswerResult};
use crate::state::{CategoryTally, Mode, ProgressionState, QuestionInfo};
use crate::timer::{QuestionTimer, TimerEvent, TimerToken};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankView {
    pub name: String,
    pub style_tag: String,
}

impl CategorySummary {
    fn new(category: &str, t: &CategoryTally) -> Self {
        Self {
            category: category.to_string(),
            correct: t.correct,
            total: t.total,
            accuracy_percent: t.accuracy_percent(),
        }
    }
}

impl From<&RankTier> for RankView {
    fn from(t: &RankTier) -> Self {
        Self { name: t.name.clone(), style_tag: t.style_tag.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionView {
    #[serde(flatten)]
    pub info: QuestionInfo,
    pub progress_percent: f64,
    pub combo_active: bool,
    pub mode: Mode,
    pub score: u64,
    pub rank: RankView,
    /// Seconds on the clock; timed mode only.
    pub time_remaining: Option<u32>,
    /// Token the tick source must pass back to [`QuizSession::tick`].
    pub timer_token: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerOutcome {
    #[serde(flatten)]
    pub result: AnswerResult,
    /// Timed-mode bonus, reported apart from `points`.
    pub time_bonus: u64,
    pub timed_out: bool,
    pub score: u64,
    pub rank: RankView,
    pub combo_active: bool,
    pub correct_count: u32,
    pub has_more: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Tick for a countdown that is no longer current.
    Ignored,
    Tick { remaining: u32 },
    TimeUp { outcome: AnswerOutcome },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub correct: u32,
    pub total: u32,
    pub accuracy_percent: f64,
}

pub const WEAK_AREA_LIMIT: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultsSummary {
    pub final_percent: f64,
    pub passed: bool,
    pub passing_score: f64,
    pub score: u64,
    pub rank: RankView,
    pub correct_count: u32,
    pub total: usize,
    pub max_streak: u32,
    /// This session's categories, weakest first.
    pub categories: Vec<CategorySummary>,
    /// Weakest categories across every recorded session, at most
    /// [`WEAK_AREA_LIMIT`].
    pub weak_areas: Vec<CategorySummary>,
    pub high_score: u64,
    pub best_rank: Option<String>,
    #[serde(flatten)]
    pub update: ProfileUpdate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Question(QuestionView),
    Finished(ResultsSummary),
}

pub struct QuizSession {
    config: GameConfig,
    state: ProgressionState,
    timer: QuestionTimer,
    profile: Profile,
    results: Option<ResultsSummary>,
}

impl QuizSession {
    pub fn new(config: GameConfig, bank: QuestionBank, profile: Profile) -> Self {
        Self {
            config,
            state: ProgressionState::new(bank, Mode::Standard),
            timer: QuestionTimer::new(),
            profile,
            results: None,
        }
    }

    /// Begin (or restart) a play-through and present the first question.
    pub fn start(&mut self, mode: Mode) -> Option<QuestionView> {
        self.timer.cancel();
        self.state.reset(mode);
        self.results = None;
        log::info!("session started ({mode:?}, {} questions)", self.state.bank().len());
        self.present()
    }

    // Displays the current question, arming a fresh countdown in timed mode.
    fn present(&mut self) -> Option<QuestionView> {
        self.state.current_question()?;
        if self.state.mode() == Mode::Timed {
            let budget = self.config.rules.question_time_secs;
            self.timer.start(budget);
            self.state.set_time_remaining(budget);
        }
        self.current_view()
    }

    pub fn current_view(&self) -> Option<QuestionView> {
        let info = self.state.question_info()?;
        let timed = self.state.mode() == Mode::Timed;
        Some(QuestionView {
            info,
            progress_percent: self.state.progress_percent(),
            combo_active: self.state.is_combo_active(self.config.scoring.combo_threshold),
            mode: self.state.mode(),
            score: self.state.score(),
            rank: self.rank_view(),
            time_remaining: timed.then(|| self.state.time_remaining()),
            timer_token: self.timer.active_token().map(TimerToken::generation),
        })
    }

    /// Score the player's pick for the current question.
    pub fn answer(&mut self, choice: usize) -> AnswerOutcome {
        let remaining = self.timer.remaining();
        let was_running = self.timer.is_running();
        // The answer must land before any later tick can expire this question.
        self.timer.cancel();
        let result = process_answer(&mut self.state, &self.config.scoring, Some(choice));
        let mut time_bonus = 0;
        if result.recorded {
            self.state.record_category_result(&result.category, result.is_correct);
            if self.state.mode() == Mode::Timed && was_running {
                time_bonus = self.config.time_bonus.bonus(remaining, result.is_correct);
                self.state.record_time_bonus(time_bonus);
            }
        }
        self.outcome(result, time_bonus, false)
    }

    /// Feed one second from the tick source.
    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        match self.timer.tick(token) {
            TimerEvent::Stale => TickOutcome::Ignored,
            TimerEvent::Tick(remaining) => {
                self.state.set_time_remaining(remaining);
                TickOutcome::Tick { remaining }
            }
            TimerEvent::Expired => {
                self.state.set_time_remaining(0);
                self.timer.cancel();
                log::debug!("time up on question {}", self.state.current_index() + 1);
                let result = process_answer(&mut self.state, &self.config.scoring, None);
                if result.recorded {
                    self.state.record_category_result(&result.category, false);
                }
                TickOutcome::TimeUp { outcome: self.outcome(result, 0, true) }
            }
        }
    }

    /// Move on. Returns the next question, or the final results when the bank
    /// is exhausted.
    pub fn advance(&mut self) -> Step {
        self.timer.cancel();
        if self.state.advance() {
            if let Some(view) = self.present() {
                return Step::Question(view);
            }
        }
        Step::Finished(self.finish())
    }

    /// Final standing. Folds the session into the profile on the first call;
    /// later calls return the same summary.
    pub fn finish(&mut self) -> ResultsSummary {
        self.timer.cancel();
        if let Some(done) = &self.results {
            return done.clone();
        }
        let final_percent = self.state.final_score_percent();
        let passing_score = self.config.rules.passing_score;
        let tier = self.config.ranks.rank_for(self.state.score());
        let update = self.profile.record_session(
            self.state.score(),
            &tier.name,
            &self.config.ranks,
            self.state.category_tally(),
        );
        let mut categories: Vec<CategorySummary> = self
            .state
            .category_tally()
            .iter()
            .map(|(name, t)| CategorySummary::new(name, t))
            .collect();
        categories.sort_by(|a, b| {
            a.accuracy_percent
                .total_cmp(&b.accuracy_percent)
                .then_with(|| a.category.cmp(&b.category))
        });
        let weak_areas = self
            .profile
            .weakest_categories()
            .into_iter()
            .take(WEAK_AREA_LIMIT)
            .map(|(name, t)| CategorySummary::new(name, &t))
            .collect();
        let summary = ResultsSummary {
            final_percent,
            passed: has_passed(final_percent, passing_score),
            passing_score,
            score: self.state.score(),
            rank: RankView::from(tier),
            correct_count: self.state.correct_count(),
            total: self.state.bank().len(),
            max_streak: self.state.max_streak(),
            categories,
            weak_areas,
            high_score: self.profile.high_score,
            best_rank: self.profile.best_rank.clone(),
            update,
        };
        log::info!(
            "session finished: {:.1}% ({}), score {}",
            summary.final_percent,
            if summary.passed { "passed" } else { "failed" },
            summary.score
        );
        self.results = Some(summary.clone());
        summary
    }

    fn outcome(&self, result: AnswerResult, time_bonus: u64, timed_out: bool) -> AnswerOutcome {
        AnswerOutcome {
            result,
            time_bonus,
            timed_out,
            score: self.state.score(),
            rank: self.rank_view(),
            combo_active: self.state.is_combo_active(self.config.scoring.combo_threshold),
            correct_count: self.state.correct_count(),
            has_more: self.state.current_index() + 1 < self.state.bank().len(),
        }
    }

    fn rank_view(&self) -> RankView {
        RankView::from(self.config.ranks.rank_for(self.state.score()))
    }

    pub fn is_finished(&self) -> bool {
        self.results.is_some()
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn timer(&self) -> &QuestionTimer {
        &self.timer
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}
