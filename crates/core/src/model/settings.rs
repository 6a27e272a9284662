use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Upstream API base used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "https://opentdb.com/api.php";

/// Largest batch the upstream API serves in one request.
pub const MAX_QUESTION_COUNT: u32 = 50;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be between 1 and 50")]
    InvalidQuestionCount,

    #[error("seconds per question must be between 15 and 30")]
    InvalidSecondsPerQuestion,

    #[error("advance delay must be at most 5000 ms")]
    InvalidAdvanceDelay,

    #[error("invalid endpoint url: {raw}")]
    InvalidEndpoint { raw: String },

    #[error("invalid value for {var}: {raw}")]
    InvalidEnv { var: &'static str, raw: String },
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Configuration for a quiz session.
///
/// Controls batch size, per-question time limit, the pause between a timeout
/// and the automatic advance, and where questions are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    question_count: u32,
    seconds_per_question: u32,
    advance_delay_ms: u32,
    endpoint: Url,
}

impl Default for QuizSettings {
    /// Ten questions, twenty seconds each, a 400 ms pause after a timeout.
    fn default() -> Self {
        Self {
            question_count: 10,
            seconds_per_question: 20,
            advance_delay_ms: 400,
            endpoint: default_endpoint(),
        }
    }
}

impl QuizSettings {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any value is outside its allowed range or the
    /// endpoint is not an absolute http(s) URL.
    pub fn new(
        question_count: u32,
        seconds_per_question: u32,
        advance_delay_ms: u32,
        endpoint: &str,
    ) -> Result<Self, SettingsError> {
        if !(1..=MAX_QUESTION_COUNT).contains(&question_count) {
            return Err(SettingsError::InvalidQuestionCount);
        }
        if !(15..=30).contains(&seconds_per_question) {
            return Err(SettingsError::InvalidSecondsPerQuestion);
        }
        if advance_delay_ms > 5_000 {
            return Err(SettingsError::InvalidAdvanceDelay);
        }
        let endpoint = parse_endpoint(endpoint)?;

        Ok(Self {
            question_count,
            seconds_per_question,
            advance_delay_ms,
            endpoint,
        })
    }

    /// Defaults overlaid with `QUIZ_API_URL`, `QUIZ_QUESTION_COUNT`,
    /// `QUIZ_SECONDS_PER_QUESTION` and `QUIZ_ADVANCE_DELAY_MS`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidEnv` for unparsable numbers, or the
    /// validation errors of [`QuizSettings::new`].
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`QuizSettings::from_env`] with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// See [`QuizSettings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let defaults = Self::default();
        let number = |var: &'static str, fallback: u32| -> Result<u32, SettingsError> {
            match lookup(var) {
                Some(raw) if !raw.trim().is_empty() => raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| SettingsError::InvalidEnv { var, raw }),
                _ => Ok(fallback),
            }
        };

        let question_count = number("QUIZ_QUESTION_COUNT", defaults.question_count)?;
        let seconds = number("QUIZ_SECONDS_PER_QUESTION", defaults.seconds_per_question)?;
        let delay = number("QUIZ_ADVANCE_DELAY_MS", defaults.advance_delay_ms)?;
        let endpoint = lookup("QUIZ_API_URL")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Self::new(question_count, seconds, delay, &endpoint)
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.advance_delay_ms))
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("default endpoint should be a valid url")
}

fn parse_endpoint(raw: &str) -> Result<Url, SettingsError> {
    let invalid = || SettingsError::InvalidEndpoint {
        raw: raw.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }
    Ok(url)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
