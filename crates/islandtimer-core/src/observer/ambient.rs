//! Ambient (lock-screen / status area) activity observer.
//!
//! The platform renders the activity; this module decides when to request,
//! update and end it based on what the shared store says. A host that
//! refuses activities is a capability downgrade, not an error: the
//! countdown keeps working without it.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::SharedStatePort;
use crate::timer::snapshot::format_clock;
use crate::timer::TimerSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActivityId(pub String);

/// Fixed for the lifetime of one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityAttributes {
    pub label: String,
    pub total_ms: u64,
}

/// Pushed on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityContent {
    pub remaining_ms: u64,
    pub total_ms: u64,
    pub label: String,
    pub running: bool,
}

#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("ambient activities are disabled")]
    Disabled,
    #[error("activity request denied: {0}")]
    Denied(String),
    #[error("unknown activity {0:?}")]
    NotFound(ActivityId),
}

/// Platform surface that renders ambient activities.
pub trait ActivityHost {
    fn activities_enabled(&self) -> bool;

    fn request(
        &mut self,
        attributes: &ActivityAttributes,
        content: &ActivityContent,
    ) -> Result<ActivityId, ActivityError>;

    fn update(&mut self, id: &ActivityId, content: &ActivityContent) -> Result<(), ActivityError>;

    fn end(&mut self, id: &ActivityId) -> Result<(), ActivityError>;
}

pub struct AmbientActivity<H, P> {
    host: H,
    port: P,
    current: Option<(ActivityId, ActivityAttributes)>,
}

impl<H: ActivityHost, P: SharedStatePort> AmbientActivity<H, P> {
    pub fn new(host: H, port: P) -> Self {
        Self {
            host,
            port,
            current: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Request a new activity, ending any existing one first.
    ///
    /// Returns false when the host has activities disabled or refuses the
    /// request.
    pub fn start(&mut self, label: &str, total_ms: u64, remaining_ms: u64) -> bool {
        if !self.host.activities_enabled() {
            info!("ambient activities not enabled, skipping");
            return false;
        }
        self.end();

        let attributes = ActivityAttributes {
            label: label.to_string(),
            total_ms,
        };
        let content = ActivityContent {
            remaining_ms,
            total_ms,
            label: label.to_string(),
            running: true,
        };
        match self.host.request(&attributes, &content) {
            Ok(id) => {
                info!(activity = %id.0, %label, "ambient activity started");
                self.current = Some((id, attributes));
                self.refresh();
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to start ambient activity");
                false
            }
        }
    }

    /// Push the latest shared state to the current activity. Ends the
    /// activity once the store no longer holds a timer.
    pub fn refresh(&mut self) {
        if self.current.is_none() {
            return;
        }
        match self.port.read() {
            Ok(Some(snapshot)) => self.push(&snapshot),
            Ok(None) => self.end(),
            Err(e) => warn!(error = %e, "ambient activity could not read shared state"),
        }
    }

    /// Observer loop step: start an activity for a newly published timer,
    /// replace it when a different timer appears, otherwise refresh.
    pub fn sync(&mut self) {
        let snapshot = match self.port.read() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "ambient activity could not read shared state");
                return;
            }
        };
        let Some(snapshot) = snapshot else {
            self.end();
            return;
        };

        let replace = self
            .current
            .as_ref()
            .map_or(true, |(_, attributes)| !same_run(attributes, &snapshot));
        if replace {
            self.start(&snapshot.label, snapshot.total_ms, snapshot.remaining_ms);
        } else {
            self.push(&snapshot);
        }
    }

    pub fn end(&mut self) {
        if let Some((id, _)) = self.current.take() {
            match self.host.end(&id) {
                Ok(()) => info!(activity = %id.0, "ambient activity ended"),
                Err(e) => warn!(error = %e, "failed to end ambient activity"),
            }
        }
    }

    fn push(&mut self, snapshot: &TimerSnapshot) {
        let Some((id, attributes)) = &self.current else {
            return;
        };
        let content = ActivityContent {
            remaining_ms: snapshot.remaining_ms,
            total_ms: attributes.total_ms,
            label: attributes.label.clone(),
            running: snapshot.running,
        };
        match self.host.update(id, &content) {
            Ok(()) => debug!(remaining = %format_clock(content.remaining_ms), "ambient activity updated"),
            Err(e) => warn!(error = %e, "failed to update ambient activity"),
        }
    }
}

fn same_run(attributes: &ActivityAttributes, snapshot: &TimerSnapshot) -> bool {
    attributes.label == snapshot.label && attributes.total_ms == snapshot.total_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SharedState};
    use chrono::Utc;

    #[derive(Default)]
    struct RecordingHost {
        disabled: bool,
        deny: bool,
        next_id: usize,
        live: Vec<ActivityId>,
        updates: Vec<ActivityContent>,
        ended: usize,
    }

    impl ActivityHost for RecordingHost {
        fn activities_enabled(&self) -> bool {
            !self.disabled
        }

        fn request(
            &mut self,
            _attributes: &ActivityAttributes,
            _content: &ActivityContent,
        ) -> Result<ActivityId, ActivityError> {
            if self.deny {
                return Err(ActivityError::Denied("user declined".into()));
            }
            self.next_id += 1;
            let id = ActivityId(format!("activity-{}", self.next_id));
            self.live.push(id.clone());
            Ok(id)
        }

        fn update(&mut self, id: &ActivityId, content: &ActivityContent) -> Result<(), ActivityError> {
            if !self.live.contains(id) {
                return Err(ActivityError::NotFound(id.clone()));
            }
            self.updates.push(content.clone());
            Ok(())
        }

        fn end(&mut self, id: &ActivityId) -> Result<(), ActivityError> {
            self.live.retain(|live| live != id);
            self.ended += 1;
            Ok(())
        }
    }

    fn publish(port: &SharedState<MemoryStore>, label: &str, remaining_ms: u64, running: bool) {
        port.write(&TimerSnapshot {
            remaining_ms,
            total_ms: 180_000,
            label: label.into(),
            running,
            last_updated: Utc::now(),
        })
        .unwrap();
    }

    #[test]
    fn start_pushes_current_state_immediately() {
        let port = SharedState::new(MemoryStore::new());
        publish(&port, "Noodles", 170_000, true);
        let mut ambient = AmbientActivity::new(RecordingHost::default(), port.clone());

        assert!(ambient.start("Noodles", 180_000, 170_000));
        assert!(ambient.is_active());
        assert_eq!(ambient.host().updates.len(), 1);
        assert_eq!(ambient.host().updates[0].remaining_ms, 170_000);
    }

    #[test]
    fn disabled_host_is_skipped() {
        let port = SharedState::new(MemoryStore::new());
        let host = RecordingHost {
            disabled: true,
            ..Default::default()
        };
        let mut ambient = AmbientActivity::new(host, port);
        assert!(!ambient.start("Noodles", 180_000, 180_000));
        assert!(!ambient.is_active());
    }

    #[test]
    fn denied_request_is_non_fatal() {
        let port = SharedState::new(MemoryStore::new());
        publish(&port, "Noodles", 170_000, true);
        let host = RecordingHost {
            deny: true,
            ..Default::default()
        };
        let mut ambient = AmbientActivity::new(host, port.clone());
        ambient.sync();
        assert!(!ambient.is_active());
        assert!(port.read().unwrap().is_some());
    }

    #[test]
    fn refresh_tracks_store_and_ends_when_cleared() {
        let port = SharedState::new(MemoryStore::new());
        publish(&port, "Noodles", 170_000, true);
        let mut ambient = AmbientActivity::new(RecordingHost::default(), port.clone());
        ambient.sync();

        publish(&port, "Noodles", 169_000, false);
        ambient.sync();
        let last = ambient.host().updates.last().unwrap();
        assert_eq!(last.remaining_ms, 169_000);
        assert!(!last.running);

        port.clear().unwrap();
        ambient.sync();
        assert!(!ambient.is_active());
        assert_eq!(ambient.host().ended, 1);
    }

    #[test]
    fn new_run_replaces_activity() {
        let port = SharedState::new(MemoryStore::new());
        publish(&port, "Noodles", 170_000, true);
        let mut ambient = AmbientActivity::new(RecordingHost::default(), port.clone());
        ambient.sync();

        publish(&port, "Pomodoro", 170_000, true);
        ambient.sync();
        assert_eq!(ambient.host().next_id, 2);
        assert_eq!(ambient.host().live.len(), 1);
        assert_eq!(ambient.host().ended, 1);
    }
}
