use std::fmt;
use std::time::Duration;

use quiz_core::model::{FetchTicket, QuizQuestion, QuizSummary};

use crate::error::FetchError;

/// Identifies one countdown run.
///
/// Every (re)started countdown gets a fresh epoch, so ticks still queued from
/// a cancelled countdown can be told apart and dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimerEpoch(u64);

impl TimerEpoch {
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for TimerEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerEpoch({})", self.0)
    }
}

/// Everything that can happen to a quiz session: user actions, fetch
/// results and timer callbacks all go through the same transition function.
#[derive(Debug)]
pub enum QuizEvent {
    /// Begin loading a fresh question batch.
    Start,
    /// A fetch issued for `ticket` resolved.
    Loaded {
        ticket: FetchTicket,
        result: Result<Vec<QuizQuestion>, FetchError>,
    },
    /// The user picked an option for the current question.
    Select(String),
    /// One second of the countdown identified by `epoch` elapsed.
    Tick { epoch: TimerEpoch },
    /// The user asked for the next question.
    Advance,
    /// Delayed advance scheduled after question `index` timed out.
    AutoAdvance { index: usize },
    /// Drop the finished session and return to idle.
    Restart,
}

impl QuizEvent {
    /// Short action name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            QuizEvent::Start => "start",
            QuizEvent::Loaded { .. } => "loaded",
            QuizEvent::Select(_) => "select",
            QuizEvent::Tick { .. } => "tick",
            QuizEvent::Advance => "advance",
            QuizEvent::AutoAdvance { .. } => "auto-advance",
            QuizEvent::Restart => "restart",
        }
    }
}

/// Side effects requested by a transition, in the order they must run.
#[derive(Debug)]
pub enum Effect {
    /// Request `amount` questions and report back as `QuizEvent::Loaded { ticket, .. }`.
    Fetch { ticket: FetchTicket, amount: u32 },
    /// Cancel any running countdown and start one emitting `Tick { epoch }` every second.
    StartTimer { epoch: TimerEpoch },
    /// Cancel the running countdown and any pending auto-advance.
    StopTimer,
    /// After `delay`, emit `QuizEvent::AutoAdvance { index }`.
    ScheduleAdvance { index: usize, delay: Duration },
    /// Loading failed; tell the user.
    NotifyFailure(FetchError),
    /// The last question was passed.
    Finished(QuizSummary),
}
