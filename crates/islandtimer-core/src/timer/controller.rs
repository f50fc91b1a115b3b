//! Primary controller: the single writer of shared timer state.
//!
//! The controller is an explicit state machine. It owns no timer thread;
//! it arms a [`TickScheduler`] and the host calls [`TimerController::tick`]
//! once per interval while armed.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |            |
//!           v            v
//!       Completed     Stopped
//! ```
//!
//! `Completed` and `Stopped` end a run and clear the shared store. Starting
//! a new preset from either resets the controller to `Idle` first.
//!
//! Every write goes through the [`SharedStatePort`], which also rotates the
//! refresh token observers watch for immediate re-reads.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::effects::DeviceEffects;
use super::scheduler::TickScheduler;
use super::snapshot::{progress, TimerSnapshot};
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::Event;
use crate::preset::{ColorTag, Preset};
use crate::storage::SharedStatePort;
use crate::validator::{Recovery, StalenessValidator};

/// Default tick period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl TimerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerState::Completed | TimerState::Stopped)
    }

    pub fn is_active(self) -> bool {
        matches!(self, TimerState::Running | TimerState::Paused)
    }
}

pub struct TimerController<P, S, E, C> {
    port: P,
    scheduler: S,
    effects: E,
    clock: C,
    tick_interval: Duration,
    validator: StalenessValidator,
    state: TimerState,
    label: String,
    total_ms: u64,
    remaining_ms: u64,
}

impl<P, S, E, C> TimerController<P, S, E, C>
where
    P: SharedStatePort,
    S: TickScheduler,
    E: DeviceEffects,
    C: Clock,
{
    /// Create an idle controller. Call [`restore`](Self::restore) afterwards
    /// to pick up a timer that outlived the previous process.
    pub fn new(port: P, scheduler: S, effects: E, clock: C) -> Self {
        Self {
            port,
            scheduler,
            effects,
            clock,
            tick_interval: DEFAULT_TICK_INTERVAL,
            validator: StalenessValidator::default(),
            state: TimerState::Idle,
            label: String::new(),
            total_ms: 0,
            remaining_ms: 0,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_validator(mut self, validator: StalenessValidator) -> Self {
        self.validator = validator;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn progress(&self) -> f64 {
        progress(self.remaining_ms, self.total_ms)
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            label: self.label.clone(),
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms,
            progress: self.progress(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting down `preset`. Only valid while no run is active.
    pub fn start(&mut self, preset: &Preset) -> Option<Event> {
        if self.state.is_active() {
            return None;
        }
        if self.state.is_terminal() {
            self.reset();
        }

        self.label = preset.name.clone();
        self.total_ms = preset.duration_ms;
        self.remaining_ms = preset.duration_ms;
        self.state = TimerState::Running;
        self.publish();
        self.scheduler.arm(self.tick_interval);

        info!(label = %self.label, total_ms = self.total_ms, "timer started");
        Some(Event::TimerStarted {
            label: self.label.clone(),
            total_ms: self.total_ms,
            at: self.clock.now(),
        })
    }

    /// Start an ad-hoc countdown that is not saved as a preset.
    pub fn start_custom(
        &mut self,
        label: &str,
        duration_ms: u64,
    ) -> Result<Option<Event>, ValidationError> {
        let preset = Preset::new(label, duration_ms, ColorTag::default())?;
        Ok(self.start(&preset))
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        self.scheduler.disarm();
        self.publish();

        info!(remaining_ms = self.remaining_ms, "timer paused");
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused || self.remaining_ms == 0 {
            return None;
        }
        self.state = TimerState::Running;
        self.publish();
        self.scheduler.arm(self.tick_interval);

        info!(remaining_ms = self.remaining_ms, "timer resumed");
        Some(Event::TimerResumed {
            remaining_ms: self.remaining_ms,
            at: self.clock.now(),
        })
    }

    /// Abandon the run. Clears the store rather than publishing zeros.
    pub fn stop(&mut self) -> Option<Event> {
        if self.state.is_terminal() {
            return None;
        }
        self.scheduler.disarm();
        self.state = TimerState::Stopped;
        self.label.clear();
        self.total_ms = 0;
        self.remaining_ms = 0;
        self.clear_shared();

        info!("timer stopped");
        Some(Event::TimerStopped {
            at: self.clock.now(),
        })
    }

    /// Return a finished controller to `Idle`. The store is left untouched.
    pub fn reset(&mut self) -> bool {
        if !self.state.is_terminal() {
            return false;
        }
        self.state = TimerState::Idle;
        self.label.clear();
        self.total_ms = 0;
        self.remaining_ms = 0;
        true
    }

    /// Advance one interval. Returns `Some(Event::TimerCompleted)` on the
    /// tick that reaches zero. Ticks outside `Running` are ignored.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }

        let step = u64::try_from(self.tick_interval.as_millis()).unwrap_or(u64::MAX);
        self.remaining_ms = self.remaining_ms.saturating_sub(step);
        // Written every tick, changed or not, so observers never lag by
        // more than one interval.
        self.publish();
        debug!(remaining_ms = self.remaining_ms, "tick");

        if self.remaining_ms == 0 {
            return Some(self.complete());
        }
        None
    }

    /// Recover state persisted by a previous process.
    ///
    /// Only applies while no run is active. Stale snapshots are cleared and
    /// leave the controller `Idle`.
    pub fn restore(&mut self) -> Option<Event> {
        if self.state.is_active() {
            return None;
        }

        let recovery = match self.validator.validate(&self.port, &self.clock) {
            Ok(recovery) => recovery,
            Err(e) => {
                warn!(error = %e, "could not read shared state during restore");
                return None;
            }
        };

        match recovery {
            Recovery::Nothing => None,
            Recovery::Cleared(reason) => {
                self.state = TimerState::Idle;
                self.label.clear();
                self.total_ms = 0;
                self.remaining_ms = 0;
                Some(Event::SnapshotCleared {
                    reason,
                    at: self.clock.now(),
                })
            }
            Recovery::Resume(snapshot) => {
                self.adopt(snapshot, TimerState::Running);
                self.publish();
                self.scheduler.arm(self.tick_interval);
                info!(label = %self.label, remaining_ms = self.remaining_ms, "resumed running timer");
                Some(self.restored_event())
            }
            Recovery::Paused(snapshot) => {
                self.adopt(snapshot, TimerState::Paused);
                info!(label = %self.label, remaining_ms = self.remaining_ms, "restored paused timer");
                Some(self.restored_event())
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        self.state = TimerState::Completed;
        self.scheduler.disarm();
        self.effects.completion_alert(&self.label);
        self.clear_shared();

        info!(label = %self.label, "timer completed");
        Event::TimerCompleted {
            label: self.label.clone(),
            total_ms: self.total_ms,
            at: self.clock.now(),
        }
    }

    fn adopt(&mut self, snapshot: TimerSnapshot, state: TimerState) {
        self.label = snapshot.label;
        self.total_ms = snapshot.total_ms;
        self.remaining_ms = snapshot.remaining_ms;
        self.state = state;
    }

    fn restored_event(&self) -> Event {
        Event::TimerRestored {
            state: self.state,
            label: self.label.clone(),
            remaining_ms: self.remaining_ms,
            at: self.clock.now(),
        }
    }

    fn current_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms,
            label: self.label.clone(),
            running: self.state == TimerState::Running,
            last_updated: self.clock.now(),
        }
    }

    /// Fire-and-forget: a failed write never alters controller state.
    fn publish(&self) {
        if let Err(e) = self.port.write(&self.current_snapshot()) {
            warn!(error = %e, "failed to publish timer snapshot");
        }
    }

    fn clear_shared(&self) {
        if let Err(e) = self.port.clear() {
            warn!(error = %e, "failed to clear shared timer state");
        }
    }
}
