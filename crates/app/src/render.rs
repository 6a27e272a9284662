use std::io::{self, Write};

use quiz_core::model::{QuizPhase, QuizSummary, UserAnswer};
use services::{QuizUpdate, SessionView};

/// Line-oriented text rendering of quiz updates.
pub struct Renderer<W: Write> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn prompt(&mut self, view: &SessionView) -> io::Result<()> {
        let hint = match view.phase {
            QuizPhase::Idle => "Press Enter to start a quiz, q to quit.",
            QuizPhase::Loading => "Loading questions...",
            QuizPhase::Active if view.locked => {
                if view.is_last_question() {
                    "Press Enter to finish."
                } else {
                    "Press Enter for the next question."
                }
            }
            QuizPhase::Active => "Type the number of your answer.",
            QuizPhase::Finished => "r = restart, n = new quiz, q = quit.",
        };
        writeln!(self.out, "{hint}")?;
        self.out.flush()
    }

    pub fn update(&mut self, update: &QuizUpdate, view: &SessionView) -> io::Result<()> {
        match update {
            QuizUpdate::Loading { .. } => self.prompt(view),
            QuizUpdate::Loaded { .. } | QuizUpdate::Advanced { .. } => self.question(view),
            QuizUpdate::LoadFailed(err) => {
                writeln!(self.out, "Failed to load questions: {err}")?;
                self.prompt(view)
            }
            QuizUpdate::Answered { correct } => {
                if *correct {
                    writeln!(self.out, "Correct!")?;
                } else if let Some(answer) = view.current_answer() {
                    writeln!(self.out, "Wrong. The answer was: {}", answer.correct_answer())?;
                }
                self.prompt(view)
            }
            QuizUpdate::Tick { seconds_remaining } => {
                if *seconds_remaining % 5 == 0 || *seconds_remaining <= 3 {
                    writeln!(self.out, "  {seconds_remaining}s left")?;
                }
                Ok(())
            }
            QuizUpdate::TimedOut => {
                if let Some(answer) = view.current_answer() {
                    writeln!(self.out, "Time's up! The answer was: {}", answer.correct_answer())?;
                }
                Ok(())
            }
            QuizUpdate::Finished(summary) => self.results(summary, &view.answers),
            QuizUpdate::Reset => self.prompt(view),
            _ => Ok(()),
        }
    }

    fn question(&mut self, view: &SessionView) -> io::Result<()> {
        let Some(question) = &view.question else {
            return Ok(());
        };
        writeln!(self.out)?;
        writeln!(
            self.out,
            "Question {}/{} [{}] {} ({:.0}% done, score: {})",
            view.question_number,
            view.total,
            question.difficulty(),
            question.category(),
            view.progress_percent,
            view.score,
        )?;
        writeln!(self.out, "{}", question.text())?;
        for (i, option) in question.options().iter().enumerate() {
            writeln!(self.out, "  {}. {option}", i + 1)?;
        }
        writeln!(self.out, "  {}s left", view.seconds_remaining)?;
        self.prompt(view)
    }

    fn results(&mut self, summary: &QuizSummary, answers: &[UserAnswer]) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Score: {} / {}", summary.correct, summary.total)?;
        writeln!(
            self.out,
            "Correct: {}  Incorrect: {}  Timed out: {}",
            summary.correct, summary.incorrect, summary.timed_out
        )?;
        for (i, answer) in answers.iter().enumerate() {
            let mark = if answer.is_correct() { "+" } else { "-" };
            let picked = answer.selected_option().unwrap_or("(no answer)");
            writeln!(self.out, "{mark} {}. {}", i + 1, answer.question_text())?;
            writeln!(
                self.out,
                "    yours: {picked}  correct: {}",
                answer.correct_answer()
            )?;
        }
        writeln!(self.out, "r = restart, n = new quiz, q = quit.")?;
        self.out.flush()
    }
}

/// Map a typed option number to the option text of the question on screen.
pub fn option_for_input(view: &SessionView, input: &str) -> Option<String> {
    let question = view.question.as_ref()?;
    let number: usize = input.parse().ok()?;
    question.options().get(number.checked_sub(1)?).cloned()
}
