use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::answer::UserAnswer;

/// Coarse lifecycle stage of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuizPhase {
    #[default]
    Idle,
    Loading,
    Active,
    Finished,
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizPhase::Idle => "idle",
            QuizPhase::Loading => "loading",
            QuizPhase::Active => "active",
            QuizPhase::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// Aggregate outcome of the answers recorded so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizSummary {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub timed_out: usize,
}

impl QuizSummary {
    /// Build a summary over `answers` for a quiz of `total` questions.
    ///
    /// `incorrect` counts every non-correct answer, timeouts included.
    #[must_use]
    pub fn from_answers(total: usize, answers: &[UserAnswer]) -> Self {
        let correct = score(answers);
        let timed_out = answers.iter().filter(|a| a.is_timed_out()).count();
        Self {
            total,
            correct,
            incorrect: answers.len() - correct,
            timed_out,
        }
    }
}

/// Number of correct answers.
#[must_use]
pub fn score(answers: &[UserAnswer]) -> usize {
    answers.iter().filter(|a| a.is_correct()).count()
}

/// Share of the quiz already passed, as a percentage in `[0, 100]`.
///
/// Returns `0.0` when there are no questions.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn progress_percent(current_index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (current_index as f64 / total as f64) * 100.0
}
