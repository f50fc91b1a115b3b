//! The unit of shared timer state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time record of a countdown, exchanged between the controller
/// and every observer through the shared store.
///
/// Durations are whole milliseconds so repeated ticks never accumulate
/// floating-point drift. The store boundary converts to fractional seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub remaining_ms: u64,
    pub total_ms: u64,
    pub label: String,
    pub running: bool,
    pub last_updated: DateTime<Utc>,
}

impl TimerSnapshot {
    /// Fraction of the countdown already elapsed, always in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        progress(self.remaining_ms, self.total_ms)
    }

    pub fn formatted_time(&self) -> String {
        format_clock(self.remaining_ms)
    }

    /// Read-side invariants: a non-empty label and a positive total.
    pub fn is_valid(&self) -> bool {
        !self.label.trim().is_empty() && self.total_ms > 0
    }
}

/// `1 - remaining/total`, clamped to `[0, 1]`; zero when `total` is zero.
pub fn progress(remaining_ms: u64, total_ms: u64) -> f64 {
    if total_ms == 0 {
        return 0.0;
    }
    (1.0 - remaining_ms as f64 / total_ms as f64).clamp(0.0, 1.0)
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub(crate) fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Converts fractional seconds to milliseconds, rejecting negative and
/// non-finite values.
pub fn secs_to_ms(secs: f64) -> Option<u64> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some((secs * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(remaining_ms: u64, total_ms: u64) -> TimerSnapshot {
        TimerSnapshot {
            remaining_ms,
            total_ms,
            label: "HIIT".into(),
            running: true,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn progress_is_zero_without_total() {
        assert_eq!(snapshot(5_000, 0).progress(), 0.0);
    }

    #[test]
    fn progress_halfway() {
        assert!((snapshot(30_000, 60_000).progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn formatted_time_pads_minutes_and_seconds() {
        assert_eq!(format_clock(45_000), "00:45");
        assert_eq!(format_clock(25 * 60 * 1000), "25:00");
        assert_eq!(format_clock(61_999), "01:01");
    }

    #[test]
    fn invalid_without_label_or_total() {
        let mut snap = snapshot(1_000, 0);
        assert!(!snap.is_valid());
        snap.total_ms = 1_000;
        snap.label = "  ".into();
        assert!(!snap.is_valid());
    }

    #[test]
    fn secs_to_ms_rejects_negative_and_nan() {
        assert_eq!(secs_to_ms(-0.5), None);
        assert_eq!(secs_to_ms(f64::NAN), None);
        assert_eq!(secs_to_ms(1.5), Some(1_500));
    }

    proptest! {
        #[test]
        fn progress_always_within_unit_interval(remaining in any::<u64>(), total in any::<u64>()) {
            let p = progress(remaining, total);
            prop_assert!((0.0..=1.0).contains(&p));
            if total == 0 {
                prop_assert_eq!(p, 0.0);
            }
        }
    }
}
