//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{FetchTicket, QuestionError, QuizPhase};

/// Errors emitted while loading a question batch.
///
/// Every variant leads to the same recovery: the session returns to idle and
/// the user has to start again.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question source returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question source returned a malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("question source returned response code {code} ({reason})")]
    ResponseCode { code: u8, reason: &'static str },
    #[error("question source returned no questions")]
    Empty,
    #[error("could not decode {field}: {raw}")]
    Decode { field: &'static str, raw: String },
    #[error(transparent)]
    Invalid(#[from] QuestionError),
}

/// An event that the session cannot apply in its current state.
///
/// These reflect UI races rather than data problems; callers log and drop them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("{action} is not allowed while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: QuizPhase,
    },
    #[error("current question is already locked")]
    Locked,
    #[error("current question has not been answered yet")]
    NotLocked,
    #[error("no current question")]
    NoQuestion,
    #[error("fetch result for superseded ticket {ticket}")]
    StaleFetch { ticket: FetchTicket },
    #[error("tick from a cancelled countdown")]
    StaleTick,
    #[error("auto-advance for question {index} no longer applies")]
    StaleAdvance { index: usize },
}
