use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a question instance within a quiz session.
///
/// Combines the question's position in the fetched batch with the fetch
/// timestamp, so two batches fetched in the same session never collide.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId {
    position: u32,
    fetched_at_ms: i64,
}

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(position: u32, fetched_at_ms: i64) -> Self {
        Self {
            position,
            fetched_at_ms,
        }
    }

    /// Zero-based position of the question in its batch
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Milliseconds since the Unix epoch at which the batch was fetched
    #[must_use]
    pub fn fetched_at_ms(&self) -> i64 {
        self.fetched_at_ms
    }
}

/// Identifies one `start` of a quiz session.
///
/// Tickets increase monotonically; a fetch result carrying an older ticket
/// than the session's latest is stale and must be dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FetchTicket(u64);

impl FetchTicket {
    /// Creates a new `FetchTicket`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the ticket that follows this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({}-{})", self.position, self.fetched_at_ms)
    }
}

impl fmt::Debug for FetchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FetchTicket({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.position, self.fetched_at_ms)
    }
}

impl fmt::Display for FetchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} format", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError {
            kind: "QuestionId".to_string(),
        };
        let (position, fetched_at) = s.split_once('-').ok_or_else(err)?;
        let position = position.parse::<u32>().map_err(|_| err())?;
        let fetched_at_ms = fetched_at.parse::<i64>().map_err(|_| err())?;
        Ok(Self::new(position, fetched_at_ms))
    }
}

impl FromStr for FetchTicket {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(FetchTicket::new)
            .map_err(|_| ParseIdError {
                kind: "FetchTicket".to_string(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
