//! Device-level side effects fired by the controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub trait DeviceEffects {
    /// Local alert (haptic pulse, bell, ...) when a countdown reaches zero.
    fn completion_alert(&self, label: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffects;

impl DeviceEffects for NoEffects {
    fn completion_alert(&self, _label: &str) {}
}

/// Counts alerts. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct RecordingEffects {
    alerts: Arc<AtomicUsize>,
}

impl RecordingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.load(Ordering::SeqCst)
    }
}

impl DeviceEffects for RecordingEffects {
    fn completion_alert(&self, _label: &str) {
        self.alerts.fetch_add(1, Ordering::SeqCst);
    }
}
