use std::fmt;

use quiz_core::model::{
    FetchTicket, QuizPhase, QuizQuestion, QuizSettings, QuizSummary, UserAnswer, progress_percent,
    score,
};

use crate::error::{FetchError, TransitionError};
use super::event::{Effect, QuizEvent, TimerEpoch};
use super::view::SessionView;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session: phase, questions, countdown, lock and answers.
///
/// Pure and timer-free. Every change goes through [`QuizSession::handle`],
/// which returns the effects the owner has to carry out (fetching, starting
/// or stopping the countdown, scheduling the post-timeout advance).
pub struct QuizSession {
    settings: QuizSettings,
    phase: QuizPhase,
    questions: Vec<QuizQuestion>,
    current: usize,
    seconds_remaining: u32,
    locked: bool,
    answers: Vec<UserAnswer>,
    ticket: FetchTicket,
    epoch: TimerEpoch,
}

impl QuizSession {
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self {
            seconds_remaining: settings.seconds_per_question(),
            settings,
            phase: QuizPhase::Idle,
            questions: Vec::new(),
            current: 0,
            locked: false,
            answers: Vec::new(),
            ticket: FetchTicket::default(),
            epoch: TimerEpoch::default(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Zero-based index of the current question; meaningful while active.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question being asked, only while the session is active.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.phase == QuizPhase::Active {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    #[must_use]
    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    /// The answer recorded for the current question, once it is locked.
    #[must_use]
    pub fn current_answer(&self) -> Option<&UserAnswer> {
        let question = self.current_question()?;
        self.answers
            .last()
            .filter(|answer| answer.question_id() == question.id())
    }

    /// Ticket of the most recent `start`.
    #[must_use]
    pub fn ticket(&self) -> FetchTicket {
        self.ticket
    }

    /// Epoch of the most recently started countdown.
    #[must_use]
    pub fn timer_epoch(&self) -> TimerEpoch {
        self.epoch
    }

    #[must_use]
    pub fn score(&self) -> usize {
        score(&self.answers)
    }

    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.current, self.questions.len())
    }

    #[must_use]
    pub fn summary(&self) -> QuizSummary {
        QuizSummary::from_answers(self.questions.len(), &self.answers)
    }

    /// Snapshot of everything a renderer may show.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            question: self.current_question().cloned(),
            question_number: self.current + 1,
            total: self.questions.len(),
            seconds_remaining: self.seconds_remaining,
            locked: self.locked,
            answers: self.answers.clone(),
            score: self.score(),
            progress_percent: self.progress_percent(),
        }
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` when the event does not apply in the current
    /// state; the session is left untouched in that case.
    pub fn handle(&mut self, event: QuizEvent) -> Result<Vec<Effect>, TransitionError> {
        let action = event.name();
        match event {
            QuizEvent::Start => self.start(action),
            QuizEvent::Loaded { ticket, result } => self.loaded(ticket, result),
            QuizEvent::Select(option) => self.select(action, option),
            QuizEvent::Tick { epoch } => self.tick(action, epoch),
            QuizEvent::Advance => self.advance(action),
            QuizEvent::AutoAdvance { index } => self.auto_advance(action, index),
            QuizEvent::Restart => self.restart(action),
        }
    }

    fn start(&mut self, action: &'static str) -> Result<Vec<Effect>, TransitionError> {
        if self.phase == QuizPhase::Active {
            return Err(self.wrong_phase(action));
        }

        self.clear();
        self.phase = QuizPhase::Loading;
        self.ticket = self.ticket.next();

        Ok(vec![
            Effect::StopTimer,
            Effect::Fetch {
                ticket: self.ticket,
                amount: self.settings.question_count(),
            },
        ])
    }

    fn loaded(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<QuizQuestion>, FetchError>,
    ) -> Result<Vec<Effect>, TransitionError> {
        if self.phase != QuizPhase::Loading || ticket != self.ticket {
            return Err(TransitionError::StaleFetch { ticket });
        }

        let questions = match result {
            Ok(questions) if questions.is_empty() => Err(FetchError::Empty),
            other => other,
        };

        match questions {
            Ok(questions) => {
                self.questions = questions;
                self.current = 0;
                self.phase = QuizPhase::Active;
                Ok(vec![self.restart_countdown()])
            }
            Err(err) => {
                self.clear();
                self.phase = QuizPhase::Idle;
                Ok(vec![Effect::NotifyFailure(err)])
            }
        }
    }

    fn select(&mut self, action: &'static str, option: String) -> Result<Vec<Effect>, TransitionError> {
        self.require_active(action)?;
        if self.locked {
            return Err(TransitionError::Locked);
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(TransitionError::NoQuestion)?;

        let answer = UserAnswer::selected(question, option);
        self.locked = true;
        self.answers.push(answer);
        Ok(vec![Effect::StopTimer])
    }

    fn tick(&mut self, action: &'static str, epoch: TimerEpoch) -> Result<Vec<Effect>, TransitionError> {
        self.require_active(action)?;
        if epoch != self.epoch {
            return Err(TransitionError::StaleTick);
        }
        if self.locked {
            return Err(TransitionError::Locked);
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return Ok(Vec::new());
        }

        let question = self
            .questions
            .get(self.current)
            .ok_or(TransitionError::NoQuestion)?;
        let answer = UserAnswer::timed_out(question);
        self.locked = true;
        self.answers.push(answer);

        Ok(vec![
            Effect::StopTimer,
            Effect::ScheduleAdvance {
                index: self.current,
                delay: self.settings.advance_delay(),
            },
        ])
    }

    fn advance(&mut self, action: &'static str) -> Result<Vec<Effect>, TransitionError> {
        self.require_active(action)?;
        if !self.locked {
            return Err(TransitionError::NotLocked);
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.locked = false;
            return Ok(vec![Effect::StopTimer, self.restart_countdown()]);
        }

        self.phase = QuizPhase::Finished;
        Ok(vec![Effect::StopTimer, Effect::Finished(self.summary())])
    }

    fn auto_advance(&mut self, action: &'static str, index: usize) -> Result<Vec<Effect>, TransitionError> {
        self.require_active(action)?;
        if index != self.current {
            return Err(TransitionError::StaleAdvance { index });
        }
        self.advance(action)
    }

    fn restart(&mut self, action: &'static str) -> Result<Vec<Effect>, TransitionError> {
        if self.phase != QuizPhase::Finished {
            return Err(self.wrong_phase(action));
        }
        self.clear();
        self.phase = QuizPhase::Idle;
        Ok(vec![Effect::StopTimer])
    }

    fn restart_countdown(&mut self) -> Effect {
        self.seconds_remaining = self.settings.seconds_per_question();
        self.epoch = self.epoch.next();
        Effect::StartTimer { epoch: self.epoch }
    }

    fn clear(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.current = 0;
        self.seconds_remaining = self.settings.seconds_per_question();
        self.locked = false;
    }

    fn require_active(&self, action: &'static str) -> Result<(), TransitionError> {
        if self.phase == QuizPhase::Active {
            Ok(())
        } else {
            Err(self.wrong_phase(action))
        }
    }

    fn wrong_phase(&self, action: &'static str) -> TransitionError {
        TransitionError::WrongPhase {
            action,
            phase: self.phase,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("seconds_remaining", &self.seconds_remaining)
            .field("locked", &self.locked)
            .field("answers_len", &self.answers.len())
            .field("ticket", &self.ticket)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    fn question(position: u32) -> QuizQuestion {
        QuizQuestion::new(
            QuestionId::new(position, 1_700_000_000_000),
            format!("Question {position}"),
            "right",
            vec!["wrong-a".into(), "right".into(), "wrong-b".into()],
            "easy",
            "General",
        )
        .unwrap()
    }

    fn batch(len: u32) -> Vec<QuizQuestion> {
        (0..len).map(question).collect()
    }

    fn settings(count: u32) -> QuizSettings {
        QuizSettings::new(count, 20, 400, quiz_core::model::DEFAULT_ENDPOINT).unwrap()
    }

    fn active_session(len: u32) -> QuizSession {
        let mut session = QuizSession::new(settings(len));
        session.handle(QuizEvent::Start).unwrap();
        let ticket = session.ticket();
        session
            .handle(QuizEvent::Loaded {
                ticket,
                result: Ok(batch(len)),
            })
            .unwrap();
        session
    }

    fn run_out_clock(session: &mut QuizSession) -> Vec<Effect> {
        let epoch = session.timer_epoch();
        let mut last = Vec::new();
        for _ in 0..session.seconds_remaining() {
            last = session.handle(QuizEvent::Tick { epoch }).unwrap();
        }
        last
    }

    fn assert_answer_invariant(session: &QuizSession) {
        assert!(session.answers().len() <= session.questions().len());
        match session.phase() {
            QuizPhase::Active => {
                let expected = session.current_index() + usize::from(session.is_locked());
                assert_eq!(session.answers().len(), expected);
            }
            QuizPhase::Finished => {
                assert_eq!(session.answers().len(), session.questions().len());
            }
            QuizPhase::Idle | QuizPhase::Loading => assert!(session.answers().is_empty()),
        }
    }

    #[test]
    fn start_moves_to_loading_and_requests_batch() {
        let mut session = QuizSession::new(settings(10));
        let effects = session.handle(QuizEvent::Start).unwrap();

        assert_eq!(session.phase(), QuizPhase::Loading);
        assert!(matches!(effects[0], Effect::StopTimer));
        assert!(matches!(
            effects[1],
            Effect::Fetch { amount: 10, ticket } if ticket == session.ticket()
        ));
    }

    #[test]
    fn successful_load_activates_and_starts_timer() {
        let mut session = QuizSession::new(settings(3));
        session.handle(QuizEvent::Start).unwrap();
        let ticket = session.ticket();
        let effects = session
            .handle(QuizEvent::Loaded {
                ticket,
                result: Ok(batch(3)),
            })
            .unwrap();

        assert_eq!(session.phase(), QuizPhase::Active);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.seconds_remaining(), 20);
        assert!(!session.is_locked());
        assert!(matches!(effects[..], [Effect::StartTimer { epoch }] if epoch == session.timer_epoch()));
        assert_eq!(session.current_question().unwrap().text(), "Question 0");
    }

    #[test]
    fn failed_load_returns_to_idle_with_nothing_retained() {
        let mut session = QuizSession::new(settings(3));
        session.handle(QuizEvent::Start).unwrap();
        let ticket = session.ticket();
        let effects = session
            .handle(QuizEvent::Loaded {
                ticket,
                result: Err(FetchError::Empty),
            })
            .unwrap();

        assert_eq!(session.phase(), QuizPhase::Idle);
        assert!(session.questions().is_empty());
        assert!(session.answers().is_empty());
        assert!(matches!(effects[..], [Effect::NotifyFailure(FetchError::Empty)]));
    }

    #[test]
    fn empty_batch_counts_as_failure() {
        let mut session = QuizSession::new(settings(3));
        session.handle(QuizEvent::Start).unwrap();
        let ticket = session.ticket();
        let effects = session
            .handle(QuizEvent::Loaded {
                ticket,
                result: Ok(Vec::new()),
            })
            .unwrap();
        assert_eq!(session.phase(), QuizPhase::Idle);
        assert!(matches!(effects[..], [Effect::NotifyFailure(FetchError::Empty)]));
    }

    #[test]
    fn stale_fetch_does_not_overwrite_newer_start() {
        let mut session = QuizSession::new(settings(2));
        session.handle(QuizEvent::Start).unwrap();
        let first = session.ticket();
        session.handle(QuizEvent::Start).unwrap();
        let second = session.ticket();
        assert!(second > first);

        let err = session
            .handle(QuizEvent::Loaded {
                ticket: first,
                result: Ok(batch(2)),
            })
            .unwrap_err();
        assert_eq!(err, TransitionError::StaleFetch { ticket: first });
        assert_eq!(session.phase(), QuizPhase::Loading);
        assert!(session.questions().is_empty());

        session
            .handle(QuizEvent::Loaded {
                ticket: second,
                result: Ok(batch(2)),
            })
            .unwrap();
        assert_eq!(session.phase(), QuizPhase::Active);
    }

    #[test]
    fn late_failure_from_superseded_fetch_is_ignored() {
        let mut session = active_session(2);
        let old = FetchTicket::default();
        let err = session
            .handle(QuizEvent::Loaded {
                ticket: old,
                result: Err(FetchError::Empty),
            })
            .unwrap_err();
        assert!(matches!(err, TransitionError::StaleFetch { .. }));
        assert_eq!(session.phase(), QuizPhase::Active);
    }

    #[test]
    fn select_locks_and_records_answer() {
        let mut session = active_session(3);
        let effects = session.handle(QuizEvent::Select("right".into())).unwrap();

        assert!(session.is_locked());
        assert!(matches!(effects[..], [Effect::StopTimer]));
        assert_eq!(session.answers().len(), 1);
        assert!(session.answers()[0].is_correct());
        assert_eq!(session.current_answer(), session.answers().last());
        assert_answer_invariant(&session);
    }

    #[test]
    fn select_while_locked_is_rejected() {
        let mut session = active_session(3);
        session.handle(QuizEvent::Select("wrong-a".into())).unwrap();
        let err = session.handle(QuizEvent::Select("right".into())).unwrap_err();

        assert_eq!(err, TransitionError::Locked);
        assert_eq!(session.answers().len(), 1);
        assert!(!session.answers()[0].is_correct());
    }

    #[test]
    fn select_while_loading_is_invalid() {
        let mut session = QuizSession::new(settings(3));
        session.handle(QuizEvent::Start).unwrap();
        let err = session.handle(QuizEvent::Select("right".into())).unwrap_err();
        assert_eq!(
            err,
            TransitionError::WrongPhase {
                action: "select",
                phase: QuizPhase::Loading
            }
        );
    }

    #[test]
    fn ticks_count_down_then_time_out() {
        let mut session = active_session(2);
        let epoch = session.timer_epoch();

        let effects = session.handle(QuizEvent::Tick { epoch }).unwrap();
        assert!(effects.is_empty());
        assert_eq!(session.seconds_remaining(), 19);

        let effects = run_out_clock(&mut session);
        assert_eq!(session.seconds_remaining(), 0);
        assert!(session.is_locked());
        assert!(session.answers()[0].is_timed_out());
        assert!(matches!(
            effects[..],
            [Effect::StopTimer, Effect::ScheduleAdvance { index: 0, .. }]
        ));

        let late = session.handle(QuizEvent::Tick { epoch }).unwrap_err();
        assert_eq!(late, TransitionError::Locked);
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn no_timeout_after_lock() {
        let mut session = active_session(2);
        let epoch = session.timer_epoch();
        session.handle(QuizEvent::Select("right".into())).unwrap();

        for _ in 0..25 {
            let err = session.handle(QuizEvent::Tick { epoch }).unwrap_err();
            assert_eq!(err, TransitionError::Locked);
        }
        assert_eq!(session.answers().len(), 1);
        assert!(session.answers()[0].is_correct());
    }

    #[test]
    fn ticks_from_previous_countdown_are_ignored() {
        let mut session = active_session(2);
        let old_epoch = session.timer_epoch();
        session.handle(QuizEvent::Select("right".into())).unwrap();
        session.handle(QuizEvent::Advance).unwrap();

        let err = session.handle(QuizEvent::Tick { epoch: old_epoch }).unwrap_err();
        assert_eq!(err, TransitionError::StaleTick);
        assert_eq!(session.seconds_remaining(), 20);
    }

    #[test]
    fn advance_while_unlocked_is_noop() {
        let mut session = active_session(3);
        let before = format!("{session:?}");
        let err = session.handle(QuizEvent::Advance).unwrap_err();
        assert_eq!(err, TransitionError::NotLocked);
        assert_eq!(format!("{session:?}"), before);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn advance_moves_to_next_question_with_fresh_countdown() {
        let mut session = active_session(3);
        let epoch = session.timer_epoch();
        session.handle(QuizEvent::Tick { epoch }).unwrap();
        session.handle(QuizEvent::Select("right".into())).unwrap();

        let effects = session.handle(QuizEvent::Advance).unwrap();
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_locked());
        assert_eq!(session.seconds_remaining(), 20);
        assert!(session.timer_epoch() > epoch);
        assert!(matches!(effects[..], [Effect::StopTimer, Effect::StartTimer { .. }]));
        assert!((session.progress_percent() - 100.0 / 3.0).abs() < 1e-9);
        assert_answer_invariant(&session);
    }

    #[test]
    fn auto_advance_only_applies_to_its_question() {
        let mut session = active_session(3);
        run_out_clock(&mut session);
        // User skips ahead manually before the scheduled advance fires.
        session.handle(QuizEvent::Advance).unwrap();
        assert_eq!(session.current_index(), 1);

        let err = session.handle(QuizEvent::AutoAdvance { index: 0 }).unwrap_err();
        assert_eq!(err, TransitionError::StaleAdvance { index: 0 });
        assert_eq!(session.current_index(), 1);

        run_out_clock(&mut session);
        session.handle(QuizEvent::AutoAdvance { index: 1 }).unwrap();
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn scenario_correct_timeout_wrong() {
        let mut session = active_session(3);

        session.handle(QuizEvent::Select("right".into())).unwrap();
        session.handle(QuizEvent::Advance).unwrap();

        let effects = run_out_clock(&mut session);
        let Some(Effect::ScheduleAdvance { index, .. }) = effects.last() else {
            panic!("timeout should schedule an advance");
        };
        session.handle(QuizEvent::AutoAdvance { index: *index }).unwrap();

        session.handle(QuizEvent::Select("wrong-b".into())).unwrap();
        let effects = session.handle(QuizEvent::Advance).unwrap();

        assert_eq!(session.phase(), QuizPhase::Finished);
        let outcome: Vec<_> = session
            .answers()
            .iter()
            .map(|a| (a.is_correct(), a.selected_option().map(str::to_owned)))
            .collect();
        assert_eq!(
            outcome,
            vec![
                (true, Some("right".to_string())),
                (false, None),
                (false, Some("wrong-b".to_string())),
            ]
        );
        assert_eq!(session.score(), 1);
        assert!(matches!(
            effects[..],
            [Effect::StopTimer, Effect::Finished(QuizSummary { total: 3, correct: 1, timed_out: 1, .. })]
        ));
        assert_answer_invariant(&session);
    }

    #[test]
    fn score_is_zero_when_everything_times_out() {
        let mut session = active_session(4);
        while session.phase() == QuizPhase::Active {
            run_out_clock(&mut session);
            let index = session.current_index();
            session.handle(QuizEvent::AutoAdvance { index }).unwrap();
            assert_answer_invariant(&session);
        }
        assert_eq!(session.score(), 0);
        assert_eq!(session.summary().timed_out, 4);
        assert_eq!(session.answers().len(), 4);
    }

    #[test]
    fn restart_from_finished_clears_without_fetch() {
        let mut session = active_session(10);
        while session.phase() == QuizPhase::Active {
            session.handle(QuizEvent::Select("right".into())).unwrap();
            session.handle(QuizEvent::Advance).unwrap();
        }
        assert_eq!(session.answers().len(), 10);
        assert_eq!(session.score(), 10);

        let effects = session.handle(QuizEvent::Restart).unwrap();
        assert_eq!(session.phase(), QuizPhase::Idle);
        assert!(session.answers().is_empty());
        assert!(session.questions().is_empty());
        assert_eq!(session.current_index(), 0);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Fetch { .. })));
    }

    #[test]
    fn start_from_finished_fetches_fresh_batch() {
        let mut session = active_session(1);
        session.handle(QuizEvent::Select("right".into())).unwrap();
        session.handle(QuizEvent::Advance).unwrap();
        assert_eq!(session.phase(), QuizPhase::Finished);

        let effects = session.handle(QuizEvent::Start).unwrap();
        assert_eq!(session.phase(), QuizPhase::Loading);
        assert!(session.answers().is_empty());
        assert!(effects.iter().any(|e| matches!(e, Effect::Fetch { .. })));
    }

    #[test]
    fn start_while_active_is_invalid() {
        let mut session = active_session(2);
        let err = session.handle(QuizEvent::Start).unwrap_err();
        assert!(matches!(err, TransitionError::WrongPhase { action: "start", .. }));
        assert_eq!(session.phase(), QuizPhase::Active);
    }

    #[test]
    fn restart_outside_finished_is_invalid() {
        let mut session = QuizSession::new(settings(2));
        let err = session.handle(QuizEvent::Restart).unwrap_err();
        assert!(matches!(err, TransitionError::WrongPhase { action: "restart", .. }));
    }

    #[test]
    fn view_reflects_session() {
        let mut session = active_session(2);
        session.handle(QuizEvent::Select("wrong-a".into())).unwrap();
        let view = session.view();

        assert_eq!(view.phase, QuizPhase::Active);
        assert_eq!(view.question_number, 1);
        assert_eq!(view.total, 2);
        assert!(view.locked);
        assert_eq!(view.score, 0);
        assert_eq!(view.answers.len(), 1);
        assert_eq!(view.question.as_ref().map(QuizQuestion::id), Some(QuestionId::new(0, 1_700_000_000_000)));
    }
}
