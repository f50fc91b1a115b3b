//! Home-screen widget observer.
//!
//! Pull model: each activation reads the shared store and produces a
//! [`Timeline`]. While a countdown runs, the timeline carries a
//! forward-projected entry per step so the host can render without calling
//! back every second, and asks to be refreshed again shortly. While idle it
//! asks for a refresh much later.
//!
//! Two triggers lead to a reload:
//! - a scheduled refresh (or explicit snapshot request) always reloads;
//! - an invalidation reloads only if the store's refresh token changed.
//!
//! Either trigger alone keeps the widget within one poll interval of the
//! controller.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use super::Activation;
use crate::clock::Clock;
use crate::storage::{SharedStatePort, WidgetConfig};
use crate::timer::snapshot::{format_clock, progress};
use crate::timer::TimerSnapshot;

/// Label shown when no timer is published.
pub const DEFAULT_LABEL: &str = "Timer";

/// Upper bound on projected entries per timeline.
pub const MAX_PROJECTED_ENTRIES: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetEntry {
    pub date: DateTime<Utc>,
    pub remaining_ms: u64,
    pub total_ms: u64,
    pub label: String,
    pub running: bool,
}

impl WidgetEntry {
    pub fn idle(date: DateTime<Utc>) -> Self {
        Self {
            date,
            remaining_ms: 0,
            total_ms: 0,
            label: DEFAULT_LABEL.into(),
            running: false,
        }
    }

    fn from_snapshot(snapshot: TimerSnapshot, date: DateTime<Utc>) -> Self {
        Self {
            date,
            running: snapshot.running && snapshot.remaining_ms > 0,
            remaining_ms: snapshot.remaining_ms,
            total_ms: snapshot.total_ms,
            label: snapshot.label,
        }
    }

    pub fn progress(&self) -> f64 {
        progress(self.remaining_ms, self.total_ms)
    }

    pub fn formatted_time(&self) -> String {
        format_clock(self.remaining_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub entries: Vec<WidgetEntry>,
    /// When the host must activate the provider again.
    pub refresh_at: DateTime<Utc>,
}

pub struct WidgetProvider<P, C> {
    port: P,
    clock: C,
    config: WidgetConfig,
    last_token: Option<String>,
}

impl<P: SharedStatePort, C: Clock> WidgetProvider<P, C> {
    pub fn new(port: P, clock: C, config: WidgetConfig) -> Self {
        Self {
            port,
            clock,
            config,
            last_token: None,
        }
    }

    /// Current entry plus the forward projection and next refresh time.
    pub fn timeline(&mut self) -> Timeline {
        let current = self.current_entry();
        let now = current.date;
        let running = current.running;

        let mut entries = Vec::new();
        if running {
            let step_secs = self.config.projection_step_secs.max(1);
            let steps = (self.config.projection_secs / step_secs).min(MAX_PROJECTED_ENTRIES);
            let remaining = current.remaining_ms;
            entries.reserve(steps as usize + 1);
            entries.push(current.clone());
            for i in 1..=steps {
                let offset_secs = i.saturating_mul(step_secs);
                let next_remaining = remaining.saturating_sub(offset_secs.saturating_mul(1000));
                entries.push(WidgetEntry {
                    date: after(now, offset_secs),
                    remaining_ms: next_remaining,
                    total_ms: current.total_ms,
                    label: current.label.clone(),
                    running: next_remaining > 0,
                });
            }
        } else {
            entries.push(current);
        }

        let delay = if running {
            self.config.running_refresh_secs
        } else {
            self.config.idle_refresh_secs
        };
        Timeline {
            entries,
            refresh_at: after(now, delay),
        }
    }

    /// Handle one activation; `None` means the displayed timeline is still
    /// current.
    pub fn activate(&mut self, activation: Activation) -> Option<Timeline> {
        match activation {
            Activation::Scheduled | Activation::SnapshotRequest => Some(self.timeline()),
            Activation::Invalidated => {
                if self.token_changed() {
                    Some(self.timeline())
                } else {
                    None
                }
            }
        }
    }

    fn token_changed(&self) -> bool {
        match self.port.refresh_token() {
            Ok(token) => token != self.last_token,
            Err(e) => {
                warn!(error = %e, "widget could not read refresh token");
                false
            }
        }
    }

    fn current_entry(&mut self) -> WidgetEntry {
        let now = self.clock.now();
        // Token first: a write landing between the two reads causes one
        // extra reload, never a missed one.
        match self.port.refresh_token() {
            Ok(token) => self.last_token = token,
            Err(e) => warn!(error = %e, "widget could not read refresh token"),
        }
        match self.port.read() {
            Ok(Some(snapshot)) => WidgetEntry::from_snapshot(snapshot, now),
            Ok(None) => WidgetEntry::idle(now),
            Err(e) => {
                warn!(error = %e, "widget could not read shared state");
                WidgetEntry::idle(now)
            }
        }
    }
}

/// `at + n` seconds, saturating at the latest representable instant.
fn after(at: DateTime<Utc>, n: u64) -> DateTime<Utc> {
    i64::try_from(n)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{MemoryStore, SharedState};

    fn provider(store: &MemoryStore, clock: &ManualClock) -> WidgetProvider<SharedState<MemoryStore>, ManualClock> {
        WidgetProvider::new(
            SharedState::new(store.clone()),
            clock.clone(),
            WidgetConfig::default(),
        )
    }

    fn publish(store: &MemoryStore, clock: &ManualClock, remaining_ms: u64, running: bool) {
        SharedState::new(store.clone())
            .write(&TimerSnapshot {
                remaining_ms,
                total_ms: 45_000,
                label: "HIIT".into(),
                running,
                last_updated: clock.now(),
            })
            .unwrap();
    }

    #[test]
    fn idle_timeline_has_single_entry_and_long_refresh() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let timeline = provider(&store, &clock).timeline();

        assert_eq!(timeline.entries.len(), 1);
        assert_eq!(timeline.entries[0].label, DEFAULT_LABEL);
        assert_eq!(timeline.entries[0].progress(), 0.0);
        assert_eq!(timeline.refresh_at, clock.now() + Duration::minutes(5));
    }

    #[test]
    fn running_timeline_projects_sixty_seconds() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        publish(&store, &clock, 45_000, true);

        let timeline = provider(&store, &clock).timeline();
        assert_eq!(timeline.entries.len(), 61);
        assert_eq!(timeline.refresh_at, clock.now() + Duration::seconds(1));

        let tenth = &timeline.entries[10];
        assert_eq!(tenth.remaining_ms, 35_000);
        assert_eq!(tenth.date, clock.now() + Duration::seconds(10));
        assert!(tenth.running);

        let last = timeline.entries.last().unwrap();
        assert_eq!(last.remaining_ms, 0);
        assert!(!last.running);
        assert!((last.progress() - 1.0).abs() < f64::EPSILON);
        assert!(!timeline.entries[45].running);
        assert!(timeline.entries[44].running);
    }

    #[test]
    fn paused_timer_is_not_projected() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        publish(&store, &clock, 20_000, false);

        let mut widget = provider(&store, &clock);
        let timeline = widget.timeline();
        assert_eq!(timeline.entries.len(), 1);
        assert_eq!(timeline.entries[0].formatted_time(), "00:20");
        assert_eq!(widget.snapshot().remaining_ms, 20_000);
    }

    #[test]
    fn invalidation_reloads_only_after_a_write() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        publish(&store, &clock, 45_000, true);

        let mut widget = provider(&store, &clock);
        assert!(widget.activate(Activation::Scheduled).is_some());
        assert!(widget.activate(Activation::Invalidated).is_none());

        publish(&store, &clock, 44_000, true);
        let timeline = widget.activate(Activation::Invalidated).unwrap();
        assert_eq!(timeline.entries[0].remaining_ms, 44_000);
        assert!(widget.activate(Activation::Invalidated).is_none());
    }

    #[test]
    fn oversized_config_saturates_instead_of_panicking() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let config = WidgetConfig {
            running_refresh_secs: 10_000_000_000_000_000,
            idle_refresh_secs: 10_000_000_000_000_000,
            projection_secs: u64::MAX,
            projection_step_secs: 1,
        };
        let mut widget =
            WidgetProvider::new(SharedState::new(store.clone()), clock.clone(), config);

        let idle = widget.timeline();
        assert_eq!(idle.refresh_at, DateTime::<Utc>::MAX_UTC);

        publish(&store, &clock, 45_000, true);
        let running = widget.timeline();
        assert_eq!(running.entries.len() as u64, MAX_PROJECTED_ENTRIES + 1);
        assert_eq!(running.refresh_at, DateTime::<Utc>::MAX_UTC);
        assert_eq!(running.entries[45].remaining_ms, 0);
    }

    #[test]
    fn scheduled_activation_always_reloads() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let mut widget = provider(&store, &clock);
        assert!(widget.activate(Activation::Scheduled).is_some());
        assert!(widget.activate(Activation::Scheduled).is_some());
        assert!(widget.activate(Activation::SnapshotRequest).is_some());
    }
}
