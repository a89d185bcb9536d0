//! DxD Academy core crate.
//!
//! A multiple-choice rating game for FAA Part 107 exam practice. The scoring
//! and progression logic (question bank validation, combo streaks, rank tiers,
//! the timed-mode countdown, the persisted profile) is plain Rust and runs
//! natively under `cargo test`; the `web` module binds it to a page.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod profile;
pub mod question;
pub mod rank;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod state;
pub mod timer;
pub mod web;

pub use config::GameConfig;
pub use error::QuizError;
pub use profile::{MemoryStore, Profile, ProfileStore};
pub use question::{
    load, load_async, load_shuffled, load_with_retry, load_with_retry_async, AsyncQuestionSource,
    Question, QuestionBank, QuestionSource,
};
pub use rank::{has_passed, rank_for, RankTable, RankTier};
pub use scoring::{process_answer, AnswerResult};
pub use session::{QuizSession, Step, TickOutcome};
pub use state::{Mode, ProgressionState};
pub use timer::{QuestionTimer, TimerEvent, TimerToken};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// Question bank shipped with the game (also served as `data/questions.json`).
pub const BUNDLED_BANK: &str = include_str!("../data/questions.json");

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

/// `config_json` overrides any part of the game configuration; `bank_json`
/// hands over the question bank inline instead of fetching it.
#[wasm_bindgen]
pub fn start_game(config_json: Option<String>, bank_json: Option<String>) -> Result<(), JsValue> {
    web::start_quiz(config_json, bank_json)
}
