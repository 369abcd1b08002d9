//! Transfer-time estimation for the confirmation prompt.

use std::fmt;

const SECS_PER_WEEK: u64 = 604_800;
const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_MINUTE: u64 = 60;

/// Aggregate size of a backup plus the expected duration at a fixed speed.
///
/// Computed once before the confirmation prompt, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    /// Total bytes across every discovered identifier.
    pub total_bytes: u64,
    /// Whole weeks of expected duration.
    pub weeks: u64,
    /// Days component (0..7).
    pub days: u64,
    /// Hours component (0..24).
    pub hours: u64,
    /// Minutes component (0..60).
    pub minutes: u64,
    /// Seconds component (0..60).
    pub seconds: u64,
}

impl SizeEstimate {
    /// Estimates how long `total_bytes` takes at `speed` bytes per second.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn for_bytes(total_bytes: u64, speed: f64) -> Self {
        let total_secs = if speed > 0.0 {
            (total_bytes as f64 / speed) as u64
        } else {
            0
        };

        let weeks = total_secs / SECS_PER_WEEK;
        let rem = total_secs % SECS_PER_WEEK;
        let days = rem / SECS_PER_DAY;
        let rem = rem % SECS_PER_DAY;
        let hours = rem / SECS_PER_HOUR;
        let rem = rem % SECS_PER_HOUR;
        let minutes = rem / SECS_PER_MINUTE;
        let seconds = rem % SECS_PER_MINUTE;

        Self {
            total_bytes,
            weeks,
            days,
            hours,
            minutes,
            seconds,
        }
    }
}

impl fmt::Display for SizeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} weeks, {} days, {} hours, {} minutes, {} seconds",
            self.weeks, self.days, self.hours, self.minutes, self.seconds
        )
    }
}
