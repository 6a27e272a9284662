//! Turns raw trivia payloads into presentable questions.

use std::borrow::Cow;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quiz_core::model::{QuestionId, QuizQuestion};

use crate::error::FetchError;
use crate::source::RawQuestion;

/// Puts a question's options into presentation order.
pub trait OptionShuffler: Send + Sync {
    fn shuffle(&self, options: &mut [String]);
}

/// Uniform random permutation of `items` (Fisher-Yates).
///
/// Walks from the last element down to index 1, swapping each with an element
/// at a uniformly chosen index in `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffles with the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngShuffler;

impl OptionShuffler for ThreadRngShuffler {
    fn shuffle(&self, options: &mut [String]) {
        fisher_yates(options, &mut rand::rng());
    }
}

/// Shuffles from a fixed seed; the same seed yields the same orderings.
#[derive(Debug)]
pub struct SeededShuffler {
    rng: Mutex<StdRng>,
}

impl SeededShuffler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl OptionShuffler for SeededShuffler {
    fn shuffle(&self, options: &mut [String]) {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        fisher_yates(options, &mut *rng);
    }
}

/// Leaves options as given: correct answer first, then the distractors.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityShuffler;

impl OptionShuffler for IdentityShuffler {
    fn shuffle(&self, _options: &mut [String]) {}
}

/// Percent-decode one field; `+` counts as an encoded space.
///
/// # Errors
///
/// Returns `FetchError::Decode` if a `%` is not followed by two hex digits or
/// the decoded bytes are not valid UTF-8.
pub fn decode_field(field: &'static str, raw: &str) -> Result<String, FetchError> {
    let undecodable = || FetchError::Decode {
        field,
        raw: raw.to_string(),
    };
    if has_malformed_escape(raw) {
        return Err(undecodable());
    }
    let spaced = raw.replace('+', "%20");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|_| undecodable())
}

fn has_malformed_escape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit))
    })
}

/// Decode and shuffle one raw question.
///
/// # Errors
///
/// Returns `FetchError::Decode` for undecodable fields and
/// `FetchError::Invalid` if the resulting options break question invariants.
pub fn normalize_question(
    position: u32,
    raw: &RawQuestion,
    shuffler: &dyn OptionShuffler,
    fetched_at_ms: i64,
) -> Result<QuizQuestion, FetchError> {
    let text = decode_field("question", &raw.question)?;
    let correct = decode_field("correct_answer", &raw.correct_answer)?;

    let mut options = Vec::with_capacity(raw.incorrect_answers.len() + 1);
    options.push(correct.clone());
    for answer in &raw.incorrect_answers {
        options.push(decode_field("incorrect_answers", answer)?);
    }
    shuffler.shuffle(&mut options);

    let question = QuizQuestion::new(
        QuestionId::new(position, fetched_at_ms),
        text,
        correct,
        options,
        decode_field("difficulty", &raw.difficulty)?,
        decode_field("category", &raw.category)?,
    )?;
    Ok(question)
}

/// Normalize a whole batch, assigning ids from position and `fetched_at_ms`.
///
/// # Errors
///
/// Fails on the first question that cannot be normalized; no partial batch is
/// returned.
pub fn normalize(
    raw: &[RawQuestion],
    shuffler: &dyn OptionShuffler,
    fetched_at_ms: i64,
) -> Result<Vec<QuizQuestion>, FetchError> {
    if raw.is_empty() {
        return Err(FetchError::Empty);
    }
    raw.iter()
        .enumerate()
        .map(|(index, question)| {
            let position = u32::try_from(index).unwrap_or(u32::MAX);
            normalize_question(position, question, shuffler, fetched_at_ms)
        })
        .collect()
}
