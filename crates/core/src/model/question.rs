use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("correct answer cannot be empty")]
    EmptyCorrectAnswer,

    #[error("a question needs at least two options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct answer must appear exactly once in the options, found {count}")]
    CorrectAnswerCount { count: usize },

    #[error("duplicate option: {option}")]
    DuplicateOption { option: String },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One trivia question prepared for presentation.
///
/// All strings are already decoded. `options` holds the correct answer
/// exactly once, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    id: QuestionId,
    text: String,
    correct_answer: String,
    options: Vec<String>,
    difficulty: String,
    category: String,
}

impl QuizQuestion {
    /// Creates a question after checking its option invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text or correct answer is blank, fewer than two
    /// options are given, the correct answer is missing or repeated, or two options
    /// are identical.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        correct_answer: impl Into<String>,
        options: Vec<String>,
        difficulty: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let correct_answer = correct_answer.into();

        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyCorrectAnswer);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.as_str()) {
                if *option == correct_answer {
                    let count = options.iter().filter(|o| **o == correct_answer).count();
                    return Err(QuestionError::CorrectAnswerCount { count });
                }
                return Err(QuestionError::DuplicateOption {
                    option: option.clone(),
                });
            }
        }
        if !seen.contains(correct_answer.as_str()) {
            return Err(QuestionError::CorrectAnswerCount { count: 0 });
        }

        Ok(Self {
            id,
            text,
            correct_answer,
            options,
            difficulty: difficulty.into(),
            category: category.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns true if `option` is this question's correct answer.
    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
