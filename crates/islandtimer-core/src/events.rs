use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;
use crate::validator::ClearReason;

/// Every controller state change produces an Event.
/// The CLI prints them as JSON; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        label: String,
        total_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    TimerCompleted {
        label: String,
        total_ms: u64,
        at: DateTime<Utc>,
    },
    /// Controller state recovered from the shared store after a relaunch.
    TimerRestored {
        state: TimerState,
        label: String,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A stale or orphaned snapshot was discarded at startup.
    SnapshotCleared {
        reason: ClearReason,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        label: String,
        remaining_ms: u64,
        total_ms: u64,
        progress: f64,
        at: DateTime<Utc>,
    },
}
