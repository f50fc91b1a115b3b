//! Startup staleness check.
//!
//! The shared store is the only state that survives the controller process
//! being killed. On launch (or return to foreground) the validator decides
//! whether the persisted snapshot is still worth resuming:
//!
//! ```text
//! remaining == 0            -> clear (orphaned: finished but never cleaned up)
//! now - lastUpdated > limit -> clear (abandoned)
//! running                   -> resume ticking from the persisted remaining time
//! paused                    -> surface as paused, no tick
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::storage::SharedStatePort;
use crate::timer::TimerSnapshot;

/// Default age after which a snapshot is considered abandoned.
pub const DEFAULT_STALE_AFTER_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearReason {
    /// Countdown had already reached zero.
    Orphaned,
    /// Snapshot was not refreshed within the staleness window.
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// No snapshot was published.
    Nothing,
    /// A snapshot existed and has been cleared.
    Cleared(ClearReason),
    /// The controller should resume ticking from this snapshot.
    Resume(TimerSnapshot),
    /// The controller should surface this snapshot as paused.
    Paused(TimerSnapshot),
}

#[derive(Debug, Clone, Copy)]
pub struct StalenessValidator {
    stale_after: Duration,
}

impl Default for StalenessValidator {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_STALE_AFTER_SECS))
    }
}

impl StalenessValidator {
    pub fn new(stale_after: Duration) -> Self {
        Self { stale_after }
    }

    /// Pure classification of a snapshot observed at `now`.
    pub fn classify(&self, snapshot: &TimerSnapshot, now: DateTime<Utc>) -> Recovery {
        if snapshot.remaining_ms == 0 {
            return Recovery::Cleared(ClearReason::Orphaned);
        }
        if now - snapshot.last_updated > self.stale_after {
            return Recovery::Cleared(ClearReason::Expired);
        }
        if snapshot.running {
            Recovery::Resume(snapshot.clone())
        } else {
            Recovery::Paused(snapshot.clone())
        }
    }

    /// Read the store, classify, and clear it when the snapshot is stale.
    pub fn validate<P, C>(&self, port: &P, clock: &C) -> Result<Recovery, StoreError>
    where
        P: SharedStatePort + ?Sized,
        C: Clock + ?Sized,
    {
        let Some(snapshot) = port.read()? else {
            return Ok(Recovery::Nothing);
        };

        let recovery = self.classify(&snapshot, clock.now());
        if let Recovery::Cleared(reason) = recovery {
            info!(
                ?reason,
                label = %snapshot.label,
                last_updated = %snapshot.last_updated,
                "clearing stale timer snapshot"
            );
            port.clear()?;
        }
        Ok(recovery)
    }
}
