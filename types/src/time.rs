//! Wall-clock timestamps used for expiring records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Current system time. A clock set before the epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// The instant `ttl` after this one, saturating at `u64::MAX`.
    pub fn after(&self, ttl: Duration) -> Self {
        Self(self.0.saturating_add(ttl.as_secs()))
    }

    /// Whether `now` has reached this timestamp.
    pub fn is_reached(&self, now: Timestamp) -> bool {
        now.0 >= self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn after_adds_whole_seconds() {
        let t = Timestamp::new(100).after(Duration::from_secs(300));
        assert_eq!(t.as_secs(), 400);
        assert!(!t.is_reached(Timestamp::new(399)));
        assert!(t.is_reached(Timestamp::new(400)));
    }

    #[test]
    fn after_saturates() {
        let t = Timestamp::new(u64::MAX - 1).after(Duration::from_secs(10));
        assert_eq!(t.as_secs(), u64::MAX);
    }
}
