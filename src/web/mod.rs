//! Browser front end.
//!
//! Fetches the question bank (with a bounded number of retries), wires the
//! page's buttons and number keys to a [`QuizSession`], drives the timed-mode
//! countdown from a one-second `setInterval`, and writes every transition back
//! into the page by element id. The page supplies the markup and styling.

use std::cell::RefCell;

use gloo_net::http::Request;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, Element};

use crate::config::GameConfig;
use crate::error::QuizError;
use crate::profile::Profile;
use crate::question::{load, load_with_retry_async, AsyncQuestionSource, QuestionBank, StaticSource};
use crate::rng::QuizRng;
use crate::session::{AnswerOutcome, QuestionView, QuizSession, ResultsSummary, Step, TickOutcome};
use crate::state::Mode;
use crate::timer::TimerToken;

pub mod storage;

use storage::LocalStorage;

const START_SCREEN: &str = "start-screen";
const GAME_WRAPPER: &str = "game-wrapper";
const BEGIN_BTN: &str = "begin-btn";
const TIMED_BTN: &str = "timed-btn";
const PROGRESS_BAR: &str = "progress-bar";
const QUESTION_TEXT: &str = "question-text";
const OPTIONS: &str = "options-container";
const FEEDBACK: &str = "feedback-area";
const EXPLANATION: &str = "explanation";
const MENTOR_IMG: &str = "mentor-img";
const SCORE: &str = "score-display";
const RANK: &str = "rank-display";
const TIMER: &str = "timer-display";
const HIGH_SCORE: &str = "high-score-display";
const RESULTS: &str = "results-container";
const NEXT_BTN: &str = "next-btn";
const LOADING: &str = "loading-indicator";
const ERROR_DISPLAY: &str = "error-display";
const ERROR_MESSAGE: &str = "error-message";
const RETRY_BTN: &str = "retry-btn";

// Set on every element (and the root element, for keydown) that already
// carries our listeners, so booting again does not stack a second set.
const BOUND_ATTR: &str = "data-dxd-bound";

const TICK_MS: i32 = 1000;

struct App {
    config: GameConfig,
    session: Option<QuizSession>,
    mode: Mode,
    // At most one interval is live; it is cleared before another is set.
    interval_id: Option<i32>,
    interval_token: Option<TimerToken>,
    tick_cb: Closure<dyn FnMut()>,
    // Bumped per boot; a fetch that resolves for an older boot is dropped.
    boot: u64,
}

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn to_js(e: QuizError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Boot the quiz on the current page. `config_json` optionally overrides any
/// part of [`GameConfig`]; `bank_json` supplies the question bank inline
/// instead of fetching `rules.data_path`.
pub fn start_quiz(config_json: Option<String>, bank_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json {
        Some(text) => GameConfig::from_json(&text).map_err(to_js)?,
        None => GameConfig::default(),
    };
    let doc = document().ok_or_else(|| JsValue::from_str("no document"))?;
    let tick_cb = Closure::wrap(Box::new(on_interval) as Box<dyn FnMut()>);
    let boot = APP.with(|cell| {
        let mut slot = cell.borrow_mut();
        let boot = match slot.as_mut() {
            Some(old) => {
                stop_interval(old);
                old.boot + 1
            }
            None => 0,
        };
        *slot = Some(App {
            config,
            session: None,
            mode: Mode::Standard,
            interval_id: None,
            interval_token: None,
            tick_cb,
            boot,
        });
        boot
    });
    install_listeners(&doc)?;
    match bank_json {
        Some(text) => on_bank_loaded(load(&StaticSource(text)), boot),
        None => load_bank(),
    }
    Ok(())
}

// --- Loading -----------------------------------------------------------------

/// Bank served over HTTP from the page's origin.
pub struct HttpSource {
    pub url: String,
}

impl AsyncQuestionSource for HttpSource {
    async fn fetch(&self) -> Result<String, QuizError> {
        let resp = Request::get(&self.url)
            .send()
            .await
            .map_err(|e| QuizError::Transport(e.to_string()))?;
        if !resp.ok() {
            return Err(QuizError::Transport(format!("HTTP {} for {}", resp.status(), self.url)));
        }
        resp.text().await.map_err(|e| QuizError::Transport(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn load_bank() {
    let Some((source, max, boot)) = with_app(|app| {
        let source = HttpSource { url: app.config.rules.data_path.clone() };
        (source, app.config.rules.max_load_attempts, app.boot)
    }) else {
        return;
    };
    show(LOADING, true);
    show(ERROR_DISPLAY, false);
    wasm_bindgen_futures::spawn_local(async move {
        let res = load_with_retry_async(&source, max).await;
        on_bank_loaded(res, boot);
    });
}

fn on_bank_loaded(res: Result<QuestionBank, QuizError>, boot: u64) {
    if with_app(|app| app.boot) != Some(boot) {
        log::debug!("dropping bank load for an earlier boot");
        return;
    }
    show(LOADING, false);
    match res {
        Ok(bank) => {
            let high = with_app(|app| {
                let bank = if app.config.rules.shuffle {
                    bank.shuffled(&mut QuizRng::from_entropy())
                } else {
                    bank
                };
                let profile = Profile::load(&LocalStorage::open(), &app.config.storage);
                let high = profile.high_score;
                app.session = Some(QuizSession::new(app.config.clone(), bank, profile));
                high
            });
            if let Some(high) = high {
                set_text(HIGH_SCORE, &format!("High Score: {high}"));
            }
            show(START_SCREEN, true);
        }
        Err(e) => {
            log::error!("failed to load quiz data: {e}");
            set_text(
                ERROR_MESSAGE,
                "Failed to load quiz data. Please check your connection and try again.",
            );
            show(ERROR_DISPLAY, true);
        }
    }
}

// --- Input -------------------------------------------------------------------

fn install_listeners(doc: &Document) -> Result<(), JsValue> {
    on_click(doc, BEGIN_BTN, |_| begin(Mode::Standard))?;
    on_click(doc, TIMED_BTN, |_| begin(Mode::Timed))?;
    on_click(doc, NEXT_BTN, |_| next_question())?;
    on_click(doc, RETRY_BTN, |_| load_bank())?;

    // One delegated listener for all option buttons.
    on_click(doc, OPTIONS, |evt: web_sys::MouseEvent| {
        let idx = evt
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest("button[data-option-index]").ok().flatten())
            .and_then(|btn| btn.get_attribute("data-option-index"))
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(idx) = idx {
            handle_answer(idx);
        }
    })?;

    if let Some(root) = doc.document_element() {
        if root.has_attribute(BOUND_ATTR) {
            return Ok(());
        }
        root.set_attribute(BOUND_ATTR, "")?;
    }
    // Number keys 1-5 pick an option; Enter moves on once feedback is shown.
    let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
        let key = evt.key();
        if key == "Enter" && is_visible(FEEDBACK) {
            evt.prevent_default();
            next_question();
            return;
        }
        let Some(n) = key.parse::<usize>().ok().filter(|n| (1..=5).contains(n)) else {
            return;
        };
        let Some(options) = element(OPTIONS) else { return };
        if is_visible(OPTIONS) && n <= options.child_element_count() as usize {
            evt.prevent_default();
            handle_answer(n - 1);
        }
    }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);
    doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn on_click(
    doc: &Document,
    id: &str,
    handler: impl FnMut(web_sys::MouseEvent) + 'static,
) -> Result<(), JsValue> {
    let Some(el) = doc.get_element_by_id(id) else {
        log::debug!("#{id} not on page; skipping listener");
        return Ok(());
    };
    if el.has_attribute(BOUND_ATTR) {
        return Ok(());
    }
    el.set_attribute(BOUND_ATTR, "")?;
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::MouseEvent)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Transitions -------------------------------------------------------------

fn begin(mode: Mode) {
    let view = with_app(|app| {
        stop_interval(app);
        app.mode = mode;
        let view = app.session.as_mut()?.start(mode)?;
        arm_interval(app, &view);
        Some(view)
    })
    .flatten();
    match view {
        Some(view) => {
            show(START_SCREEN, false);
            show(GAME_WRAPPER, true);
            render_question(&view);
        }
        None => log::warn!("start pressed before the question bank loaded"),
    }
}

fn handle_answer(choice: usize) {
    let outcome = with_app(|app| {
        stop_interval(app);
        app.session.as_mut().map(|s| s.answer(choice))
    })
    .flatten();
    if let Some(outcome) = outcome.filter(|o| o.result.recorded) {
        render_outcome(&outcome);
    }
}

fn next_question() {
    let step = with_app(|app| {
        stop_interval(app);
        let step = app.session.as_mut()?.advance();
        match &step {
            Step::Question(view) => arm_interval(app, view),
            Step::Finished(_) => save_profile(app),
        }
        Some(step)
    })
    .flatten();
    match step {
        Some(Step::Question(view)) => render_question(&view),
        Some(Step::Finished(results)) => render_results(&results),
        None => {}
    }
}

fn restart() {
    let mode = with_app(|app| app.mode).unwrap_or_default();
    begin(mode);
}

fn save_profile(app: &App) {
    if let Some(session) = &app.session {
        session
            .profile()
            .save_or_warn(&mut LocalStorage::open(), &app.config.storage);
    }
}

// --- Countdown ---------------------------------------------------------------

fn arm_interval(app: &mut App, view: &QuestionView) {
    stop_interval(app);
    let Some(generation) = view.timer_token else { return };
    let Some(win) = window() else { return };
    match win.set_interval_with_callback_and_timeout_and_arguments_0(
        app.tick_cb.as_ref().unchecked_ref(),
        TICK_MS,
    ) {
        Ok(id) => {
            app.interval_id = Some(id);
            app.interval_token = Some(TimerToken::from_generation(generation));
        }
        Err(e) => log::error!("setInterval failed: {e:?}"),
    }
}

fn stop_interval(app: &mut App) {
    if let Some(id) = app.interval_id.take() {
        if let Some(win) = window() {
            win.clear_interval_with_handle(id);
        }
    }
    app.interval_token = None;
}

fn on_interval() {
    let tick = with_app(|app| {
        let token = app.interval_token?;
        let out = app.session.as_mut()?.tick(token);
        if !matches!(out, TickOutcome::Tick { .. }) {
            stop_interval(app);
        }
        Some(out)
    })
    .flatten();
    match tick {
        Some(TickOutcome::Tick { remaining }) => set_text(TIMER, &format!("{remaining}s")),
        Some(TickOutcome::TimeUp { outcome }) => {
            set_text(TIMER, "0s");
            render_outcome(&outcome);
        }
        Some(TickOutcome::Ignored) | None => {}
    }
}

// --- Rendering ---------------------------------------------------------------

fn render_question(view: &QuestionView) {
    show(FEEDBACK, false);
    if let Some(bar) = element(PROGRESS_BAR) {
        let pct = view.progress_percent.clamp(0.0, 100.0);
        bar.set_attribute("style", &format!("width:{pct}%")).ok();
    }
    set_text(
        QUESTION_TEXT,
        &format!("[{}/{}] {}", view.info.current, view.info.total, view.info.text),
    );
    if let Some(img) = element(MENTOR_IMG) {
        let prefix = with_app(|app| app.config.assets_path.clone()).unwrap_or_default();
        img.set_attribute("src", &format!("{prefix}{}", view.info.mentor)).ok();
    }
    set_class(GAME_WRAPPER, "boost-active", view.combo_active);
    set_text(SCORE, &format!("Demonic Power: {}", view.score));
    set_rank(&view.rank.name, &view.rank.style_tag);
    match view.time_remaining {
        Some(secs) => {
            set_text(TIMER, &format!("{secs}s"));
            show(TIMER, true);
        }
        None => show(TIMER, false),
    }
    if let Err(e) = render_options(&view.info.options) {
        log::error!("could not render options: {e:?}");
    }
}

fn render_options(options: &[String]) -> Result<(), JsValue> {
    let (Some(doc), Some(container)) = (document(), element(OPTIONS)) else {
        return Ok(());
    };
    container.set_inner_html("");
    for (i, opt) in options.iter().enumerate() {
        let btn = doc.create_element("button")?;
        btn.set_attribute("type", "button")?;
        btn.set_attribute("data-option-index", &i.to_string())?;
        btn.set_text_content(Some(opt));
        container.append_child(&btn)?;
    }
    show(OPTIONS, true);
    Ok(())
}

fn render_outcome(out: &AnswerOutcome) {
    let status = if out.timed_out {
        "TIME'S UP!"
    } else if out.result.is_correct {
        "CRITICAL HIT!"
    } else {
        "DAMAGE TAKEN!"
    };
    let mut detail = out.result.explanation.clone();
    if out.time_bonus > 0 {
        detail.push_str(&format!(" (+{} speed bonus)", out.time_bonus));
    }
    if let Err(e) = fill_feedback(status, out.result.is_correct, &detail) {
        log::error!("could not render feedback: {e:?}");
    }
    show(FEEDBACK, true);
    show(OPTIONS, false);
    set_class(GAME_WRAPPER, "boost-active", out.combo_active);
    set_text(SCORE, &format!("Demonic Power: {}", out.score));
    set_rank(&out.rank.name, &out.rank.style_tag);
    set_text(NEXT_BTN, if out.has_more { "Next" } else { "See Results" });
}

fn fill_feedback(status: &str, correct: bool, detail: &str) -> Result<(), JsValue> {
    let (Some(doc), Some(target)) = (document(), element(EXPLANATION)) else {
        return Ok(());
    };
    target.set_inner_html("");
    let span = doc.create_element("span")?;
    span.set_class_name(if correct { "feedback-correct" } else { "feedback-incorrect" });
    span.set_text_content(Some(status));
    target.append_child(&span)?;
    let body = doc.create_element("p")?;
    body.set_text_content(Some(detail));
    target.append_child(&body)?;
    Ok(())
}

fn render_results(r: &ResultsSummary) {
    // Enter only advances while feedback is up
    show(FEEDBACK, false);
    if let Err(e) = build_results(r) {
        log::error!("could not render results: {e:?}");
    }
    if r.update.new_high_score {
        set_text(HIGH_SCORE, &format!("High Score: {} (new!)", r.high_score));
    }
}

fn build_results(r: &ResultsSummary) -> Result<(), JsValue> {
    let (Some(doc), Some(container)) = (document(), element(RESULTS)) else {
        return Ok(());
    };
    let wrapper = doc.create_element("div")?;
    wrapper.set_class_name(if r.passed { "results passed" } else { "results failed" });

    let heading = doc.create_element("h2")?;
    let message = doc.create_element("p")?;
    if r.passed {
        heading.set_text_content(Some("FAA PART 107 CERTIFICATE EARNED!"));
        message.set_text_content(Some(&format!(
            "Congratulations, Devil! You passed the FAA Rating Game with a score of {:.1}%.",
            r.final_percent
        )));
    } else {
        heading.set_text_content(Some("RATING GAME FAILED!"));
        message.set_text_content(Some(&format!(
            "You scored {:.1}%. The minimum passing score is {}%. You must retry the academy!",
            r.final_percent, r.passing_score
        )));
    }
    wrapper.append_child(&heading)?;
    wrapper.append_child(&message)?;

    let rank = doc.create_element("h3")?;
    rank.set_class_name(&r.rank.style_tag);
    rank.set_text_content(Some(&format!("Rank: {}", r.rank.name)));
    wrapper.append_child(&rank)?;

    let stats = doc.create_element("p")?;
    stats.set_text_content(Some(&format!(
        "{}/{} correct, best combo {}, demonic power {}",
        r.correct_count, r.total, r.max_streak, r.score
    )));
    wrapper.append_child(&stats)?;

    if !r.categories.is_empty() {
        let list = doc.create_element("ul")?;
        list.set_class_name("category-breakdown");
        for c in &r.categories {
            let item = doc.create_element("li")?;
            item.set_text_content(Some(&format!(
                "{}: {}/{} ({:.0}%)",
                c.category, c.correct, c.total, c.accuracy_percent
            )));
            list.append_child(&item)?;
        }
        wrapper.append_child(&list)?;
    }

    if !r.weak_areas.is_empty() {
        let names: Vec<&str> = r.weak_areas.iter().map(|c| c.category.as_str()).collect();
        let focus = doc.create_element("p")?;
        focus.set_class_name("weak-areas");
        focus.set_text_content(Some(&format!("Train next: {}", names.join(", "))));
        wrapper.append_child(&focus)?;
    }

    let button = doc.create_element("button")?;
    button.set_attribute("type", "button")?;
    button.set_text_content(Some(if r.passed {
        "Re-Train at the Academy"
    } else {
        "Retry the Academy"
    }));
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
        if let Some(results) = element(RESULTS) {
            results.set_inner_html("");
        }
        show(RESULTS, false);
        restart();
    }) as Box<dyn FnMut(_)>);
    button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    wrapper.append_child(&button)?;

    show(GAME_WRAPPER, false);
    container.set_inner_html("");
    container.append_child(&wrapper)?;
    show(RESULTS, true);
    Ok(())
}

// --- DOM helpers -------------------------------------------------------------

fn document() -> Option<Document> {
    window().and_then(|w| w.document())
}

fn element(id: &str) -> Option<Element> {
    document().and_then(|d| d.get_element_by_id(id))
}

fn set_text(id: &str, text: &str) {
    if let Some(el) = element(id) {
        el.set_text_content(Some(text));
    }
}

fn set_rank(name: &str, style_tag: &str) {
    if let Some(el) = element(RANK) {
        el.set_text_content(Some(&format!("Rank: {name}")));
        el.set_class_name(style_tag);
    }
}

fn set_class(id: &str, class: &str, on: bool) {
    if let Some(el) = element(id) {
        let list = el.class_list();
        let res = if on { list.add_1(class) } else { list.remove_1(class) };
        if let Err(e) = res {
            log::debug!("could not toggle .{class} on #{id}: {e:?}");
        }
    }
}

fn show(id: &str, visible: bool) {
    set_class(id, "hidden", !visible);
}

fn is_visible(id: &str) -> bool {
    element(id).is_some_and(|el| !el.class_list().contains("hidden"))
}
