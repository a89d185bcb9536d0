//! Question records, the validated question bank and its loader.
//!
//! The bank JSON looks like:
//!
//! ```json
//! { "questions": [
//!     { "question": "Max altitude AGL?", "options": ["400 ft", "500 ft"], "answer": 0,
//!       "explanation": "...", "category": "Regulations", "mentor": "akeno_smile.png" }
//! ] }
//! ```
//!
//! Loading is all-or-nothing: the first bad record fails the whole load.

use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{DEFAULT_CATEGORY, DEFAULT_MENTOR};
use crate::error::QuizError;
use crate::rng::QuizRng;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    pub explanation: String,
    pub category: String,
    pub mentor_image_key: String,
}

// Wire shape of one record; everything optional so validation can name the
// missing field instead of surfacing a generic serde message.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: Option<String>,
    options: Option<Vec<String>>,
    answer: Option<i64>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    mentor: Option<String>,
}

impl RawQuestion {
    fn validate(self, idx: usize) -> Result<Question, QuizError> {
        let text = match self.question {
            Some(t) if !t.trim().is_empty() => t,
            Some(_) => return Err(QuizError::record(idx, "question", "is empty")),
            None => return Err(QuizError::record(idx, "question", "is missing")),
        };
        let options = self
            .options
            .ok_or_else(|| QuizError::record(idx, "options", "is missing"))?;
        if options.len() < 2 {
            return Err(QuizError::record(
                idx,
                "options",
                format!("needs at least 2 entries, found {}", options.len()),
            ));
        }
        if let Some(pos) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuizError::record(idx, "options", format!("entry {pos} is empty")));
        }
        let answer = self
            .answer
            .ok_or_else(|| QuizError::record(idx, "answer", "is missing"))?;
        let out_of_range = || {
            let reason = format!("{answer} is out of range for {} options", options.len());
            QuizError::record(idx, "answer", reason)
        };
        // usize is 32 bits on wasm32, so narrow with a checked conversion
        let Ok(answer_index) = usize::try_from(answer) else {
            return Err(out_of_range());
        };
        if answer_index >= options.len() {
            return Err(out_of_range());
        }
        Ok(Question {
            text,
            answer_index,
            options,
            explanation: self.explanation.unwrap_or_default(),
            category: non_blank(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            mentor_image_key: non_blank(self.mentor)
                .unwrap_or_else(|| DEFAULT_MENTOR.to_string()),
        })
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Validated, non-empty, read-only sequence of questions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::format("questions", "is empty"));
        }
        Ok(Self { questions })
    }

    /// Parse and validate a bank document.
    pub fn from_json(text: &str) -> Result<Self, QuizError> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| QuizError::format("document", format!("is not valid JSON: {e}")))?;
        let list = match doc.get("questions") {
            Some(Value::Array(list)) => list,
            Some(_) => return Err(QuizError::format("questions", "is not a sequence")),
            None => return Err(QuizError::format("questions", "is missing")),
        };
        if list.is_empty() {
            return Err(QuizError::format("questions", "is empty"));
        }
        let mut questions = Vec::with_capacity(list.len());
        for (idx, item) in list.iter().enumerate() {
            if !item.is_object() {
                return Err(QuizError::record(idx, "record", "is not an object"));
            }
            let raw: RawQuestion = serde_json::from_value(item.clone())
                .map_err(|e| QuizError::record(idx, "record", e.to_string()))?;
            questions.push(raw.validate(idx)?);
        }
        Self::new(questions)
    }

    /// Apply one uniform permutation. Only done at load time.
    pub fn shuffled(mut self, rng: &mut QuizRng) -> Self {
        rng.shuffle(&mut self.questions);
        self
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Question> {
        self.questions.get(idx)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for q in &self.questions {
            if !out.contains(&q.category.as_str()) {
                out.push(&q.category);
            }
        }
        out
    }
}

/// Where raw bank text comes from (bundled string, file, HTTP response...).
pub trait QuestionSource {
    fn fetch(&self) -> Result<String, QuizError>;

    /// Human-readable origin for log lines.
    fn describe(&self) -> String {
        "question source".to_string()
    }
}

/// Bank text already in memory (bundled, or handed over by the page).
pub struct StaticSource(pub String);

impl QuestionSource for StaticSource {
    fn fetch(&self) -> Result<String, QuizError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "inline bank".to_string()
    }
}

/// Bank read from disk; used by native tools and tests.
pub struct FileSource(pub PathBuf);

impl QuestionSource for FileSource {
    fn fetch(&self) -> Result<String, QuizError> {
        std::fs::read_to_string(&self.0)
            .map_err(|e| QuizError::Transport(format!("{}: {e}", self.0.display())))
    }

    fn describe(&self) -> String {
        self.0.display().to_string()
    }
}

/// Async counterpart of [`QuestionSource`] for sources that have to await
/// I/O, such as an HTTP fetch in the browser.
pub trait AsyncQuestionSource {
    fn fetch(&self) -> impl Future<Output = Result<String, QuizError>>;

    fn describe(&self) -> String {
        "question source".to_string()
    }
}

fn accept(text: &str, origin: &str) -> Result<QuestionBank, QuizError> {
    match QuestionBank::from_json(text) {
        Ok(bank) => {
            log::info!(
                "loaded {} questions ({}) from {origin}",
                bank.len(),
                bank.categories().join(", ")
            );
            Ok(bank)
        }
        Err(e) => {
            log::warn!("rejected {origin}: {e}");
            Err(e)
        }
    }
}

/// Fetch and validate. Stateless, so it is safe to call again after a failure.
pub fn load<S: QuestionSource + ?Sized>(source: &S) -> Result<QuestionBank, QuizError> {
    let text = source.fetch()?;
    accept(&text, &source.describe())
}

/// [`load`] for an [`AsyncQuestionSource`].
pub async fn load_async<S: AsyncQuestionSource + ?Sized>(source: &S) -> Result<QuestionBank, QuizError> {
    let text = source.fetch().await?;
    accept(&text, &source.describe())
}

/// [`load`] followed by a single shuffle.
pub fn load_shuffled<S: QuestionSource + ?Sized>(
    source: &S,
    rng: &mut QuizRng,
) -> Result<QuestionBank, QuizError> {
    load(source).map(|bank| bank.shuffled(rng))
}

// Attempt bookkeeping shared by the blocking and async retry loops.
struct Retry {
    max_attempts: u32,
    last: QuizError,
}

impl Retry {
    fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            last: QuizError::Transport("no load attempted".to_string()),
        }
    }

    fn attempts(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.max_attempts
    }

    // Returns whether another attempt is worth making.
    fn failed(&mut self, attempt: u32, e: QuizError) -> bool {
        log::warn!("load attempt {attempt}/{} failed: {e}", self.max_attempts);
        let retry = e.is_retryable();
        self.last = e;
        retry
    }
}

/// Caller-side retry: re-issue [`load`] up to `max_attempts` times and hand
/// back the last error. Format errors stop early since the data won't change.
pub fn load_with_retry<S: QuestionSource + ?Sized>(
    source: &S,
    max_attempts: u32,
) -> Result<QuestionBank, QuizError> {
    let mut retry = Retry::new(max_attempts);
    for attempt in retry.attempts() {
        match load(source) {
            Ok(bank) => return Ok(bank),
            Err(e) => {
                if !retry.failed(attempt, e) {
                    break;
                }
            }
        }
    }
    Err(retry.last)
}

/// [`load_with_retry`] for an [`AsyncQuestionSource`]; same policy.
pub async fn load_with_retry_async<S: AsyncQuestionSource + ?Sized>(
    source: &S,
    max_attempts: u32,
) -> Result<QuestionBank, QuizError> {
    let mut retry = Retry::new(max_attempts);
    for attempt in retry.attempts() {
        match load_async(source).await {
            Ok(bank) => return Ok(bank),
            Err(e) => {
                if !retry.failed(attempt, e) {
                    break;
                }
            }
        }
    }
    Err(retry.last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_get_defaults() {
        let bank = QuestionBank::from_json(
            r#"{"questions": [{"question": "Q", "options": ["a", "b"], "answer": 1}]}"#,
        )
        .unwrap();
        let q = bank.get(0).unwrap();
        assert_eq!(q.answer_index, 1);
        assert_eq!(q.explanation, "");
        assert_eq!(q.category, DEFAULT_CATEGORY);
        assert_eq!(q.mentor_image_key, DEFAULT_MENTOR);
    }

    #[test]
    fn blank_category_falls_back_to_general() {
        let bank = QuestionBank::from_json(
            r#"{"questions": [{"question": "Q", "options": ["a", "b"], "answer": 0, "category": "  "}]}"#,
        )
        .unwrap();
        assert_eq!(bank.get(0).unwrap().category, "General");
    }

    #[test]
    fn error_names_failing_record_and_field() {
        let err = QuestionBank::from_json(
            r#"{"questions": [
                {"question": "ok", "options": ["a", "b"], "answer": 0},
                {"question": "bad", "options": ["a", "b"], "answer": -1}
            ]}"#,
        )
        .unwrap_err();
        match err {
            QuizError::Format { record, field, .. } => {
                assert_eq!(record, Some(1));
                assert_eq!(field, "answer");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn answer_beyond_u32_is_rejected() {
        let err = QuestionBank::from_json(
            r#"{"questions": [{"question": "Q", "options": ["a", "b"], "answer": 4294967296}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::Format { record: Some(0), ref field, .. } if field == "answer"));
        let err = QuestionBank::from_json(
            r#"{"questions": [{"question": "Q", "options": ["a", "b"], "answer": -4294967296}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::Format { record: Some(0), .. }));
    }

    #[test]
    fn wrong_types_are_format_errors() {
        let err = QuestionBank::from_json(
            r#"{"questions": [{"question": "Q", "options": ["a", "b"], "answer": "0"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::Format { record: Some(0), .. }));
        let err = QuestionBank::from_json(r#"{"questions": [42]}"#).unwrap_err();
        assert!(matches!(err, QuizError::Format { record: Some(0), .. }));
    }

    #[test]
    fn categories_in_first_seen_order() {
        let bank = QuestionBank::from_json(
            r#"{"questions": [
                {"question": "1", "options": ["a", "b"], "answer": 0, "category": "Weather"},
                {"question": "2", "options": ["a", "b"], "answer": 0, "category": "Airspace"},
                {"question": "3", "options": ["a", "b"], "answer": 0, "category": "Weather"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(bank.categories(), vec!["Weather", "Airspace"]);
    }

    #[test]
    fn empty_bank_cannot_be_built_directly() {
        assert!(QuestionBank::new(Vec::new()).is_err());
    }
}
