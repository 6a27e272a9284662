use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::QuizQuestion;

/// The record of how the user resolved one question.
///
/// Question text, options and the correct answer are copied in so a finished
/// session can be reviewed without the original question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    question_id: QuestionId,
    selected_option: Option<String>,
    correct_answer: String,
    is_correct: bool,
    question_text: String,
    options: Vec<String>,
}

impl UserAnswer {
    /// Records `option` as the answer to `question`.
    ///
    /// Correctness is decided here, once.
    #[must_use]
    pub fn selected(question: &QuizQuestion, option: impl Into<String>) -> Self {
        let option = option.into();
        let is_correct = question.is_correct(&option);
        Self::build(question, Some(option), is_correct)
    }

    /// Records that `question` ran out of time without a selection.
    #[must_use]
    pub fn timed_out(question: &QuizQuestion) -> Self {
        Self::build(question, None, false)
    }

    fn build(question: &QuizQuestion, selected_option: Option<String>, is_correct: bool) -> Self {
        Self {
            question_id: question.id(),
            selected_option,
            correct_answer: question.correct_answer().to_owned(),
            is_correct,
            question_text: question.text().to_owned(),
            options: question.options().to_vec(),
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    /// The chosen option, or `None` when the question timed out.
    #[must_use]
    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.selected_option.is_none()
    }

    #[must_use]
    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuizQuestion {
        QuizQuestion::new(
            QuestionId::new(2, 10),
            "2 + 2?",
            "4",
            vec!["3".into(), "4".into(), "5".into()],
            "easy",
            "Math",
        )
        .unwrap()
    }

    #[test]
    fn selected_correct_option_is_correct() {
        let q = question();
        let answer = UserAnswer::selected(&q, "4");
        assert!(answer.is_correct());
        assert_eq!(answer.selected_option(), Some("4"));
        assert_eq!(answer.question_id(), q.id());
        assert_eq!(answer.options(), q.options());
        assert_eq!(answer.question_text(), "2 + 2?");
    }

    #[test]
    fn selected_wrong_option_is_incorrect() {
        let answer = UserAnswer::selected(&question(), "5");
        assert!(!answer.is_correct());
        assert!(!answer.is_timed_out());
        assert_eq!(answer.correct_answer(), "4");
    }

    #[test]
    fn timeout_has_no_selection_and_is_incorrect() {
        let answer = UserAnswer::timed_out(&question());
        assert!(answer.is_timed_out());
        assert!(!answer.is_correct());
        assert_eq!(answer.selected_option(), None);
    }
}
