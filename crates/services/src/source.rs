use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use quiz_core::model::QuizSettings;

use crate::error::FetchError;

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One question as served by the trivia API, every string percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub category: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Top-level response body of the trivia API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaResponse {
    pub response_code: u8,
    pub results: Vec<RawQuestion>,
}

/// Anything that can hand out a batch of raw questions.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch `amount` raw questions.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failures or payloads of the wrong shape.
    async fn fetch(&self, amount: u32) -> Result<Vec<RawQuestion>, FetchError>;
}

/// Question source backed by the Open Trivia DB HTTP API.
#[derive(Clone)]
pub struct OpenTriviaSource {
    client: Client,
    endpoint: Url,
}

impl OpenTriviaSource {
    /// Build a source for the endpoint configured in `settings`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be constructed.
    pub fn new(settings: &QuizSettings) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint().clone(),
        })
    }

    /// The URL requested for a batch of `amount` questions.
    #[must_use]
    pub fn request_url(&self, amount: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("amount", &amount.to_string())
            .append_pair("type", "multiple")
            .append_pair("encode", "url3986");
        url
    }
}

#[async_trait]
impl QuestionSource for OpenTriviaSource {
    async fn fetch(&self, amount: u32) -> Result<Vec<RawQuestion>, FetchError> {
        let url = self.request_url(amount);
        debug!(%url, "fetching questions");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

/// Scripted in-memory question source.
///
/// Each `fetch` consumes the next scripted response, optionally after a delay;
/// once the script is exhausted every fetch fails with `FetchError::Empty`.
#[derive(Debug, Default)]
pub struct InMemorySource {
    script: Mutex<VecDeque<(Duration, Result<Vec<RawQuestion>, FetchError>)>>,
    calls: AtomicUsize,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    #[must_use]
    pub fn with_batch(self, batch: Vec<RawQuestion>) -> Self {
        self.with_delayed(Duration::ZERO, Ok(batch))
    }

    /// Queue a failing response.
    #[must_use]
    pub fn with_failure(self, err: FetchError) -> Self {
        self.with_delayed(Duration::ZERO, Err(err))
    }

    /// Queue a response that resolves after `delay`.
    #[must_use]
    pub fn with_delayed(
        self,
        delay: Duration,
        response: Result<Vec<RawQuestion>, FetchError>,
    ) -> Self {
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back((delay, response));
        self
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for InMemorySource {
    async fn fetch(&self, amount: u32) -> Result<Vec<RawQuestion>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        let Some((delay, response)) = next else {
            return Err(FetchError::Empty);
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let amount = usize::try_from(amount).unwrap_or(usize::MAX);
        response.map(|mut batch| {
            batch.truncate(amount);
            batch
        })
    }
}

/// Parse a trivia API body into its question list.
///
/// # Errors
///
/// Returns `FetchError::Malformed` if the JSON does not have the expected shape,
/// `FetchError::ResponseCode` for a non-zero API response code, and
/// `FetchError::Empty` when the result list is empty.
pub fn parse_response(body: &str) -> Result<Vec<RawQuestion>, FetchError> {
    let response: TriviaResponse = serde_json::from_str(body)?;
    if response.response_code != 0 {
        return Err(FetchError::ResponseCode {
            code: response.response_code,
            reason: response_code_reason(response.response_code),
        });
    }
    if response.results.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(response.results)
}

fn response_code_reason(code: u8) -> &'static str {
    match code {
        1 => "not enough questions for the query",
        2 => "invalid parameter",
        3 => "session token not found",
        4 => "session token exhausted",
        5 => "rate limited",
        _ => "unknown",
    }
}
