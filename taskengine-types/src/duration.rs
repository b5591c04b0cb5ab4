//! A millisecond-resolution duration that serializes as a plain integer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock duration in milliseconds.
///
/// Serializes as a bare JSON integer (`"timeout": 30000`) rather than
/// serde's default `Duration` shape, which matters for event payloads
/// and HTTP request/response bodies that cross a language boundary.
///
/// ```
/// use taskengine_types::duration::DurationMs;
/// let d = DurationMs::from_secs(30);
/// assert_eq!(serde_json::to_string(&d).unwrap(), "30000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(pub u64);

impl DurationMs {
    /// Zero duration.
    pub const ZERO: DurationMs = DurationMs(0);

    /// Construct from a millisecond count.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Construct from a whole second count.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Milliseconds as a plain integer.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Convert to a `std::time::Duration`.
    pub fn to_std(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        d.to_std()
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
