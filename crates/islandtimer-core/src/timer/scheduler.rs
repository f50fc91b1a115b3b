//! Tick scheduling capability.
//!
//! The controller decides *when* ticks should fire (arm/disarm) but never
//! owns a timer. The host loop (tokio interval in the CLI, a manual loop in
//! tests) checks [`TickScheduler::is_armed`] and calls
//! [`TimerController::tick`](super::TimerController::tick).

use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait TickScheduler {
    /// Start (or restart) periodic ticks at `interval`.
    fn arm(&mut self, interval: Duration);
    /// Invalidate any pending tick callback.
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
}

/// Scheduler backed by a shared flag; the host loop polls it.
#[derive(Debug, Clone, Default)]
pub struct IntervalScheduler {
    inner: Arc<Mutex<Option<Duration>>>,
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick period, `None` while disarmed.
    pub fn period(&self) -> Option<Duration> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TickScheduler for IntervalScheduler {
    fn arm(&mut self, interval: Duration) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(interval);
    }

    fn disarm(&mut self) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn is_armed(&self) -> bool {
        self.period().is_some()
    }
}

/// Records every arm/disarm call. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    log: Arc<Mutex<SchedulerLog>>,
}

#[derive(Debug, Default)]
struct SchedulerLog {
    armed: Option<Duration>,
    arm_calls: usize,
    disarm_calls: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm_calls(&self) -> usize {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).arm_calls
    }

    pub fn disarm_calls(&self) -> usize {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).disarm_calls
    }

    pub fn interval(&self) -> Option<Duration> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).armed
    }
}

impl TickScheduler for ManualScheduler {
    fn arm(&mut self, interval: Duration) {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.armed = Some(interval);
        log.arm_calls += 1;
    }

    fn disarm(&mut self) {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.armed = None;
        log.disarm_calls += 1;
    }

    fn is_armed(&self) -> bool {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .armed
            .is_some()
    }
}
