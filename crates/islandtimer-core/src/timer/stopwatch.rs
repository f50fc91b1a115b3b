//! Count-up stopwatch.
//!
//! Local to the foreground controller; never published to the shared
//! store. Like the countdown it has no internal thread: the host calls
//! [`Stopwatch::tick`] every [`STOPWATCH_TICK`] while it is armed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resolution of the stopwatch display.
pub const STOPWATCH_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stopwatch {
    state: StopwatchState,
    elapsed_ms: u64,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: StopwatchState::Idle,
            elapsed_ms: 0,
        }
    }

    pub fn state(&self) -> StopwatchState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_running(&self) -> bool {
        self.state == StopwatchState::Running
    }

    /// Start from zero. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.state == StopwatchState::Running {
            return false;
        }
        self.elapsed_ms = 0;
        self.state = StopwatchState::Running;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != StopwatchState::Running {
            return false;
        }
        self.state = StopwatchState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != StopwatchState::Paused {
            return false;
        }
        self.state = StopwatchState::Running;
        true
    }

    /// Stop and reset to zero.
    pub fn stop(&mut self) {
        self.state = StopwatchState::Idle;
        self.elapsed_ms = 0;
    }

    /// Add `interval` while running; ignored otherwise.
    pub fn tick(&mut self, interval: Duration) {
        if self.state == StopwatchState::Running {
            let step = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
            self.elapsed_ms = self.elapsed_ms.saturating_add(step);
        }
    }

    /// `MM:SS.cc`
    pub fn formatted(&self) -> String {
        let total_secs = self.elapsed_ms / 1000;
        let centis = (self.elapsed_ms % 1000) / 10;
        format!("{:02}:{:02}.{:02}", total_secs / 60, total_secs % 60, centis)
    }
}
