use quiz_core::model::{QuizPhase, QuizQuestion, UserAnswer};

/// Presentation-agnostic snapshot of a quiz session.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no styling decisions
///
/// The renderer decides how to show correctness, countdown and progress.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: QuizPhase,
    /// Present only while the session is active.
    pub question: Option<QuizQuestion>,
    /// One-based number of the current question.
    pub question_number: usize,
    pub total: usize,
    pub seconds_remaining: u32,
    pub locked: bool,
    pub answers: Vec<UserAnswer>,
    pub score: usize,
    pub progress_percent: f64,
}

impl SessionView {
    /// The answer recorded for the question on screen, if it is locked.
    #[must_use]
    pub fn current_answer(&self) -> Option<&UserAnswer> {
        let question = self.question.as_ref()?;
        self.answers
            .last()
            .filter(|answer| answer.question_id() == question.id())
    }

    /// True when the question on screen is the last one.
    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.question_number == self.total
    }
}
