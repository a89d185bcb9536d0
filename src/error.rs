//! Error taxonomy shared by the loader, the profile store and the browser glue.

use thiserror::Error;

/// Errors surfaced by quiz operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The question source (or a config document) failed structural or
    /// field-level validation.
    #[error("{}", format_message(.record, .field, .reason))]
    Format {
        record: Option<usize>,
        field: String,
        reason: String,
    },

    /// The question source could not be reached or answered with a failure status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Browser storage is disabled or rejected a read/write.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

fn format_message(record: &Option<usize>, field: &str, reason: &str) -> String {
    match record {
        Some(idx) => format!("invalid question #{idx}: field `{field}` {reason}"),
        None => format!("invalid quiz data: field `{field}` {reason}"),
    }
}

impl QuizError {
    pub(crate) fn format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        QuizError::Format {
            record: None,
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn record(idx: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        QuizError::Format {
            record: Some(idx),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Both format and transport failures mean "load failed" to the game loop;
    /// the distinction only matters for retry messaging.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, QuizError::Format { .. } | QuizError::Transport(_))
    }

    /// Transport failures may succeed on a later attempt, bad data never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuizError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors_name_index_and_field() {
        let err = QuizError::record(4, "answer", "is out of range for 3 options");
        assert_eq!(
            err.to_string(),
            "invalid question #4: field `answer` is out of range for 3 options"
        );
    }

    #[test]
    fn storage_errors_are_not_load_failures() {
        assert!(!QuizError::StorageUnavailable("disabled".into()).is_load_failure());
        assert!(QuizError::Transport("HTTP 404".into()).is_load_failure());
        assert!(QuizError::format("questions", "is missing").is_load_failure());
    }
}
