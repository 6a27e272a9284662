#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod normalize;
pub mod session;
pub mod source;

pub use quiz_core::Clock;

pub use controller::{QuizController, QuizUpdate};
pub use error::{FetchError, TransitionError};
pub use normalize::{IdentityShuffler, OptionShuffler, SeededShuffler, ThreadRngShuffler};
pub use session::{Effect, QuizEvent, QuizSession, SessionView, TimerEpoch};
pub use source::{InMemorySource, OpenTriviaSource, QuestionSource, RawQuestion, TriviaResponse};
