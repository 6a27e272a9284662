use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{FetchTicket, QuizSettings, QuizSummary, UserAnswer};

use crate::error::{FetchError, TransitionError};
use crate::normalize::{OptionShuffler, ThreadRngShuffler, normalize};
use crate::session::{Effect, QuizEvent, QuizSession, SessionView, TimerEpoch};
use crate::source::QuestionSource;

/// Countdown resolution.
const TICK: Duration = Duration::from_secs(1);

/// What a processed event did, for the renderer to react to.
#[derive(Debug)]
#[non_exhaustive]
pub enum QuizUpdate {
    /// A fetch is in flight.
    Loading { ticket: FetchTicket },
    /// Questions arrived and the first one is on screen.
    Loaded { total: usize },
    /// Loading failed; the session is idle again.
    LoadFailed(FetchError),
    /// The current question was answered.
    Answered { correct: bool },
    /// The countdown moved.
    Tick { seconds_remaining: u32 },
    /// The countdown reached zero; an advance is scheduled.
    TimedOut,
    /// A new question is on screen.
    Advanced { index: usize },
    /// The last question was passed.
    Finished(QuizSummary),
    /// The session was cleared back to idle.
    Reset,
    /// The event did not apply and was dropped.
    Ignored(TransitionError),
}

/// Owns one quiz session and the tasks that feed it.
///
/// User actions are applied synchronously; timer ticks, fetch results and
/// post-timeout advances arrive through an internal channel and are applied by
/// [`QuizController::next_update`]. At most one countdown task runs at a time.
///
/// Methods that start work spawn Tokio tasks and must be called from within a
/// Tokio runtime.
pub struct QuizController {
    session: QuizSession,
    source: Arc<dyn QuestionSource>,
    shuffler: Arc<dyn OptionShuffler>,
    clock: Clock,
    events_tx: UnboundedSender<QuizEvent>,
    events_rx: UnboundedReceiver<QuizEvent>,
    timer: Option<JoinHandle<()>>,
    pending_advance: Option<JoinHandle<()>>,
}

impl QuizController {
    #[must_use]
    pub fn new(settings: QuizSettings, source: Arc<dyn QuestionSource>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session: QuizSession::new(settings),
            source,
            shuffler: Arc::new(ThreadRngShuffler),
            clock: Clock::System,
            events_tx,
            events_rx,
            timer: None,
            pending_advance: None,
        }
    }

    /// Replace the option shuffler (e.g. with a seeded or identity one in tests).
    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Arc<dyn OptionShuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }

    /// Replace the clock used for question ids.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    /// Begin loading a fresh batch of questions.
    pub fn start(&mut self) -> QuizUpdate {
        self.dispatch(QuizEvent::Start)
    }

    /// Answer the current question with `option`.
    pub fn select(&mut self, option: impl Into<String>) -> QuizUpdate {
        self.dispatch(QuizEvent::Select(option.into()))
    }

    /// Move past the current, already locked question.
    pub fn advance(&mut self) -> QuizUpdate {
        self.dispatch(QuizEvent::Advance)
    }

    /// Clear a finished session without fetching.
    pub fn restart(&mut self) -> QuizUpdate {
        self.dispatch(QuizEvent::Restart)
    }

    /// Wait for the next tick, fetch result or scheduled advance and apply it.
    ///
    /// Waits indefinitely while nothing is pending (e.g. idle, or a locked
    /// question waiting for the user).
    pub async fn next_update(&mut self) -> Option<QuizUpdate> {
        let event = self.events_rx.recv().await?;
        Some(self.dispatch(event))
    }

    fn dispatch(&mut self, event: QuizEvent) -> QuizUpdate {
        let action = event.name();
        let kind = EventKind::of(&event);

        let effects = match self.session.handle(event) {
            Ok(effects) => effects,
            Err(err) => {
                debug!(action, error = %err, "ignoring quiz event");
                return QuizUpdate::Ignored(err);
            }
        };

        let mut update = None;
        for effect in effects {
            match effect {
                Effect::Fetch { ticket, amount } => self.spawn_fetch(ticket, amount),
                Effect::StartTimer { epoch } => self.start_timer(epoch),
                Effect::StopTimer => self.stop_timer(),
                Effect::ScheduleAdvance { index, delay } => {
                    self.schedule_advance(index, delay);
                    update = Some(QuizUpdate::TimedOut);
                }
                Effect::NotifyFailure(err) => {
                    warn!(error = %err, "failed to load questions");
                    update = Some(QuizUpdate::LoadFailed(err));
                }
                Effect::Finished(summary) => {
                    info!(
                        score = summary.correct,
                        total = summary.total,
                        timed_out = summary.timed_out,
                        "quiz finished"
                    );
                    update = Some(QuizUpdate::Finished(summary));
                }
            }
        }

        update.unwrap_or_else(|| self.describe(kind))
    }

    fn describe(&self, kind: EventKind) -> QuizUpdate {
        match kind {
            EventKind::Start => QuizUpdate::Loading {
                ticket: self.session.ticket(),
            },
            EventKind::Loaded => {
                let total = self.session.questions().len();
                info!(total, "quiz started");
                QuizUpdate::Loaded { total }
            }
            EventKind::Select => QuizUpdate::Answered {
                correct: self
                    .session
                    .answers()
                    .last()
                    .is_some_and(UserAnswer::is_correct),
            },
            EventKind::Tick => QuizUpdate::Tick {
                seconds_remaining: self.session.seconds_remaining(),
            },
            EventKind::Advance => QuizUpdate::Advanced {
                index: self.session.current_index(),
            },
            EventKind::Restart => QuizUpdate::Reset,
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket, amount: u32) {
        debug!(%ticket, amount, "requesting question batch");
        let source = Arc::clone(&self.source);
        let shuffler = Arc::clone(&self.shuffler);
        let clock = self.clock;
        let tx = self.events_tx.clone();

        // In-flight fetches are not cancelled; superseded results are dropped by ticket.
        tokio::spawn(async move {
            let result = match source.fetch(amount).await {
                Ok(raw) => normalize(&raw, shuffler.as_ref(), clock.now_millis()),
                Err(err) => Err(err),
            };
            let _ = tx.send(QuizEvent::Loaded { ticket, result });
        });
    }

    fn start_timer(&mut self, epoch: TimerEpoch) {
        self.abort_timer();
        debug!(epoch = epoch.value(), "starting countdown");
        let tx = self.events_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticks.tick().await;
                if tx.send(QuizEvent::Tick { epoch }).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_timer(&mut self) {
        self.abort_timer();
        if let Some(handle) = self.pending_advance.take() {
            handle.abort();
        }
    }

    fn abort_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    fn schedule_advance(&mut self, index: usize, delay: Duration) {
        let tx = self.events_tx.clone();
        self.pending_advance = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(QuizEvent::AutoAdvance { index });
        }));
    }
}

/// Which kind of event produced an update, captured before the event is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Start,
    Loaded,
    Select,
    Tick,
    Advance,
    Restart,
}

impl EventKind {
    fn of(event: &QuizEvent) -> Self {
        match event {
            QuizEvent::Start => Self::Start,
            QuizEvent::Loaded { .. } => Self::Loaded,
            QuizEvent::Select(_) => Self::Select,
            QuizEvent::Tick { .. } => Self::Tick,
            QuizEvent::Advance | QuizEvent::AutoAdvance { .. } => Self::Advance,
            QuizEvent::Restart => Self::Restart,
        }
    }
}

impl Drop for QuizController {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

impl fmt::Debug for QuizController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizController")
            .field("session", &self.session)
            .field("clock", &self.clock)
            .field("timer_running", &self.timer.is_some())
            .field("advance_pending", &self.pending_advance.is_some())
            .finish_non_exhaustive()
    }
}
