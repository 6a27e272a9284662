use chrono::{DateTime, Utc};

/// Source of the fetch timestamp stamped into question ids.
///
/// Countdown timing does not read this clock; it is driven by tick events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Frozen(DateTime<Utc>),
}

impl Clock {
    /// A clock that always reports `ms` milliseconds after the Unix epoch.
    ///
    /// Out-of-range values freeze at the epoch itself.
    #[must_use]
    pub fn frozen_at_millis(ms: i64) -> Self {
        Self::Frozen(DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default())
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Frozen(at) => *at,
        }
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Fetch timestamp used by deterministic tests (2023-11-14T22:13:20Z).
pub const FROZEN_TEST_MILLIS: i64 = 1_700_000_000_000;

/// A clock frozen at [`FROZEN_TEST_MILLIS`], so question ids are predictable.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::frozen_at_millis(FROZEN_TEST_MILLIS)
}
