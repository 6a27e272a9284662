mod event;
mod machine;
mod view;

// Public API of the session subsystem.
pub use crate::error::TransitionError;
pub use event::{Effect, QuizEvent, TimerEpoch};
pub use machine::QuizSession;
pub use view::SessionView;
