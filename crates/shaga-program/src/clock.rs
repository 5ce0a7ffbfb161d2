//! Ledger time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The ledger's notion of the current time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    /// Seconds since the Unix epoch.
    pub unix_timestamp: i64,
}

impl Clock {
    /// A clock at the given Unix timestamp.
    #[must_use]
    pub const fn at(unix_timestamp: i64) -> Self {
        Self { unix_timestamp }
    }

    /// A clock at the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// A clock at the given instant.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            unix_timestamp: at.timestamp(),
        }
    }

    /// The timestamp as stored in records. Pre-epoch times clamp to zero.
    #[must_use]
    pub fn unix_seconds(&self) -> u64 {
        u64::try_from(self.unix_timestamp).unwrap_or(0)
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, seconds: i64) {
        self.unix_timestamp = self.unix_timestamp.saturating_add(seconds);
    }

    /// The timestamp as a calendar instant, if representable.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.unix_timestamp, 0)
    }
}
