// Full play-throughs of a session: combo scoring, rank progression and the
// pass/fail outcome.

use dxd_academy::config::{GameConfig, ScoringConfig};
use dxd_academy::{Mode, Profile, QuestionBank, QuizSession, Step};

// Every question's correct answer is option 1.
fn bank(n: usize, categories: &[&str]) -> QuestionBank {
    let items: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"question": "Q{i}", "options": ["x", "y", "z"], "answer": 1,
                    "explanation": "E{i}", "category": "{}"}}"#,
                categories[i % categories.len()]
            )
        })
        .collect();
    QuestionBank::from_json(&format!(r#"{{"questions": [{}]}}"#, items.join(","))).unwrap()
}

fn session(n: usize) -> QuizSession {
    QuizSession::new(GameConfig::default(), bank(n, &["General"]), Profile::default())
}

fn play(s: &mut QuizSession, answers: &[usize]) -> (Vec<u64>, Step) {
    s.start(Mode::Standard).expect("bank has a first question");
    let mut points = Vec::new();
    let mut last = None;
    for &a in answers {
        points.push(s.answer(a).result.points);
        last = Some(s.advance());
    }
    (points, last.expect("at least one answer"))
}

#[test]
fn combo_bonus_starts_after_threshold() {
    let mut s = session(4);
    let (points, _) = play(&mut s, &[1, 1, 1, 1]);
    assert_eq!(points, vec![100, 100, 100, 200]);
}

#[test]
fn combo_bonus_with_custom_scoring() {
    let mut cfg = GameConfig::default();
    cfg.scoring = ScoringConfig { base_points: 10, combo_multiplier: 3, combo_threshold: 1 };
    let mut s = QuizSession::new(cfg, bank(3, &["General"]), Profile::default());
    let (points, _) = play(&mut s, &[1, 1, 1]);
    assert_eq!(points, vec![10, 30, 30]);
}

#[test]
fn five_correct_answers_end_to_end() {
    let mut s = session(5);
    let (points, last) = play(&mut s, &[1, 1, 1, 1, 1]);
    assert_eq!(points, vec![100, 100, 100, 200, 200]);
    let Step::Finished(r) = last else { panic!("bank should be exhausted") };
    assert_eq!(r.correct_count, 5);
    assert_eq!(r.final_percent, 100.0);
    assert_eq!(r.score, 700);
    assert!(r.passed);
    assert_eq!(r.max_streak, 5);
    assert_eq!(r.rank.name, "Lower-Class Devil");
}

#[test]
fn seventy_percent_passes_sixty_fails() {
    let mut s = session(10);
    let (_, last) = play(&mut s, &[1, 1, 1, 1, 1, 1, 1, 0, 0, 0]);
    let Step::Finished(r) = last else { panic!("expected results") };
    assert_eq!(r.final_percent, 70.0);
    assert!(r.passed);

    let mut s = session(10);
    let (_, last) = play(&mut s, &[1, 1, 1, 1, 1, 1, 0, 0, 0, 0]);
    let Step::Finished(r) = last else { panic!("expected results") };
    assert!(!r.passed);
}

#[test]
fn rank_climbs_with_score() {
    let mut s = session(12);
    s.start(Mode::Standard);
    let mut ranks = Vec::new();
    for _ in 0..12 {
        ranks.push(s.answer(1).rank.name);
        s.advance();
    }
    // running score: 100, 200, 300, 500, 700, ... 1300, 1500, ... 2100
    assert_eq!(ranks[0], "Lower-Class Devil");
    assert_eq!(ranks[7], "Lower-Class Devil");
    assert_eq!(ranks[8], "Middle-Class Devil");
    assert_eq!(ranks[11], "Middle-Class Devil");
    assert_eq!(s.finish().score, 2100);
}

#[test]
fn view_tracks_progress_and_combo() {
    let mut s = session(4);
    let first = s.start(Mode::Standard).unwrap();
    assert_eq!(first.progress_percent, 0.0);
    assert!(!first.combo_active);
    let mut view = first;
    for _ in 0..3 {
        s.answer(1);
        let Step::Question(next) = s.advance() else { panic!("more questions expected") };
        view = next;
    }
    assert_eq!(view.info.current, 4);
    assert_eq!(view.progress_percent, 75.0);
    assert!(view.combo_active);
}

#[test]
fn wrong_answer_reports_correct_index_and_explanation() {
    let mut s = session(1);
    s.start(Mode::Standard);
    let out = s.answer(2);
    assert!(!out.result.is_correct);
    assert_eq!(out.result.correct_index, Some(1));
    assert_eq!(out.result.explanation, "E0");
    assert!(!out.has_more);
}

#[test]
fn answers_after_the_end_are_neutral() {
    let mut s = session(1);
    s.start(Mode::Standard);
    s.answer(1);
    s.advance();
    let out = s.answer(1);
    assert!(!out.result.recorded);
    assert_eq!(out.score, 100);
    assert_eq!(s.state().correct_count(), 1);
}

#[test]
fn restart_resets_session_but_keeps_profile() {
    let mut s = session(2);
    play(&mut s, &[1, 1]);
    assert_eq!(s.profile().high_score, 200);
    let view = s.start(Mode::Standard).unwrap();
    assert_eq!(view.score, 0);
    assert_eq!(view.info.current, 1);
    assert!(!s.is_finished());
    assert_eq!(s.profile().high_score, 200);
}

#[test]
fn category_breakdown_reports_weak_areas() {
    let mut s = QuizSession::new(
        GameConfig::default(),
        bank(6, &["Weather", "Airspace", "Regulations"]),
        Profile::default(),
    );
    // Weather: 2/2, Airspace: 0/2, Regulations: 1/2
    let (_, last) = play(&mut s, &[1, 0, 1, 1, 0, 0]);
    let Step::Finished(r) = last else { panic!("expected results") };
    let order: Vec<(&str, u32, u32)> =
        r.categories.iter().map(|c| (c.category.as_str(), c.correct, c.total)).collect();
    assert_eq!(
        order,
        vec![("Airspace", 0, 2), ("Regulations", 1, 2), ("Weather", 2, 2)]
    );
}

#[test]
fn records_serialize_for_the_renderer() {
    let mut s = session(2);
    let view = s.start(Mode::Standard).unwrap();
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["current"], 1);
    assert_eq!(json["total"], 2);
    assert_eq!(json["mode"], "standard");
    assert_eq!(json["rank"]["style_tag"], "rank-low");

    let out = serde_json::to_value(s.answer(1)).unwrap();
    assert_eq!(out["is_correct"], true);
    assert_eq!(out["points"], 100);

    let step = serde_json::to_value(s.advance()).unwrap();
    assert_eq!(step["kind"], "question");
}
