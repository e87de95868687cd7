//! Millisecond duration used for run timeouts.
//!
//! Timeouts are configured as plain integers of milliseconds
//! (`{"timeout": 5000}`), so [`DurationMs`] serializes transparently as a
//! `u64` rather than serde's `{"secs", "nanos"}` form for `Duration`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whole milliseconds. `Display` renders as `250ms`, which is what
/// timeout errors show.
///
/// # Examples
///
/// ```
/// use dataload_core::DurationMs;
///
/// let t = DurationMs::from_millis(250);
/// assert_eq!(t.to_string(), "250ms");
/// assert_eq!(serde_json::to_string(&t).unwrap(), "250");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(u64);

impl DurationMs {
    /// Create from milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Create from seconds, saturating on overflow.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// The value in milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Convert to `std::time::Duration`.
    pub const fn to_std(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    /// Sub-millisecond precision is truncated; durations beyond `u64::MAX`
    /// milliseconds saturate.
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_sub_millisecond_precision() {
        let d = DurationMs::from(Duration::from_micros(1_999));
        assert_eq!(d.as_millis(), 1);
    }

    #[test]
    fn secs_saturate() {
        assert_eq!(DurationMs::from_secs(u64::MAX).as_millis(), u64::MAX);
        assert_eq!(DurationMs::from_secs(15).as_millis(), 15_000);
    }
}
