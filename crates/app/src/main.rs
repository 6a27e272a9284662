use std::fmt;
use std::sync::Arc;

use quiz_core::model::{QuizPhase, QuizSettings};
use services::{OpenTriviaSource, QuizController, QuizUpdate};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod render;

use render::{Renderer, option_for_input};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

const USAGE: &str = "\
Usage:
  cargo run -p app -- [--count <n>] [--seconds <s>] [--api-url <url>]

Defaults:
  --count 10       (1-50)
  --seconds 20     (15-30)
  --api-url https://opentdb.com/api.php

Environment:
  QUIZ_QUESTION_COUNT, QUIZ_SECONDS_PER_QUESTION, QUIZ_ADVANCE_DELAY_MS,
  QUIZ_API_URL, RUST_LOG
";

fn print_usage() {
    eprint!("{USAGE}");
}

/// A bad command line, reported together with the usage text.
#[derive(Debug)]
struct UsageError(ArgsError);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.0, USAGE.trim_end())
    }
}

impl std::error::Error for UsageError {}

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    count: Option<u32>,
    seconds: Option<u32>,
    api_url: Option<String>,
    help: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--count" => parsed.count = Some(require_number(args, "--count")?),
                "--seconds" => parsed.seconds = Some(require_number(args, "--seconds")?),
                "--api-url" => parsed.api_url = Some(require_value(args, "--api-url")?),
                "--help" | "-h" => parsed.help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }

    /// Environment-derived settings with command-line flags on top.
    fn settings(&self, base: &QuizSettings) -> Result<QuizSettings, quiz_core::Error> {
        let endpoint = self
            .api_url
            .clone()
            .unwrap_or_else(|| base.endpoint().to_string());
        let delay_ms = u32::try_from(base.advance_delay().as_millis()).unwrap_or(u32::MAX);
        Ok(QuizSettings::new(
            self.count.unwrap_or(base.question_count()),
            self.seconds.unwrap_or(base.seconds_per_question()),
            delay_ms,
            &endpoint,
        )?)
    }
}

fn init_logging() {
    // Logs go to stderr so they do not interleave with the quiz on stdout.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Apply one line of user input to the quiz.
fn handle_input(quiz: &mut QuizController, input: &str) -> (Flow, Option<QuizUpdate>) {
    if input.eq_ignore_ascii_case("q") {
        return (Flow::Quit, None);
    }

    let view = quiz.view();
    let update = match view.phase {
        QuizPhase::Idle if input.is_empty() || input.eq_ignore_ascii_case("s") => {
            Some(quiz.start())
        }
        QuizPhase::Active if view.locked && (input.is_empty() || input.eq_ignore_ascii_case("n")) => {
            Some(quiz.advance())
        }
        QuizPhase::Active if !view.locked => {
            option_for_input(&view, input).map(|option| quiz.select(option))
        }
        QuizPhase::Finished if input.eq_ignore_ascii_case("r") => Some(quiz.restart()),
        QuizPhase::Finished if input.eq_ignore_ascii_case("n") => Some(quiz.start()),
        _ => None,
    };
    (Flow::Continue, update)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(UsageError)?;
    if args.help {
        print_usage();
        return Ok(());
    }

    let base = QuizSettings::from_env().map_err(quiz_core::Error::from)?;
    let settings = args.settings(&base)?;
    tracing::debug!(?settings, "resolved quiz settings");

    let source = Arc::new(OpenTriviaSource::new(&settings)?);
    let mut quiz = QuizController::new(settings, source);
    let mut renderer = Renderer::new(std::io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    renderer.prompt(&quiz.view())?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let (flow, update) = handle_input(&mut quiz, line.trim());
                if flow == Flow::Quit {
                    break;
                }
                match update {
                    Some(update) => renderer.update(&update, &quiz.view())?,
                    None => renderer.prompt(&quiz.view())?,
                }
            }
            Some(update) = quiz.next_update() => {
                renderer.update(&update, &quiz.view())?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
