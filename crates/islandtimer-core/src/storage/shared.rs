//! Shared state port: the only channel between the controller and the
//! widget/ambient observers.
//!
//! ## Keys
//!
//! ```text
//! remainingTime  float seconds
//! totalTime      float seconds
//! label          string
//! running        bool
//! lastUpdated    RFC 3339 timestamp
//! refreshToken   string, rewritten on every write/clear
//! ```
//!
//! Absence of all snapshot keys means "no active timer". Anything in
//! between (a torn write, a mistyped value, a broken invariant) is treated
//! as absent and cleared on read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::kv::{Batch, KeyValueStore};
use crate::error::{StoreError, ValidationError};
use crate::timer::snapshot::{ms_to_secs, secs_to_ms};
use crate::timer::TimerSnapshot;

pub const REMAINING_TIME_KEY: &str = "remainingTime";
pub const TOTAL_TIME_KEY: &str = "totalTime";
pub const LABEL_KEY: &str = "label";
pub const RUNNING_KEY: &str = "running";
pub const LAST_UPDATED_KEY: &str = "lastUpdated";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

const SNAPSHOT_KEYS: [&str; 5] = [
    REMAINING_TIME_KEY,
    TOTAL_TIME_KEY,
    LABEL_KEY,
    RUNNING_KEY,
    LAST_UPDATED_KEY,
];

/// Capability handed to the controller and to every observer.
pub trait SharedStatePort {
    /// Publish a full snapshot and signal observers to re-read.
    fn write(&self, snapshot: &TimerSnapshot) -> Result<(), StoreError>;

    /// Remove every snapshot key and signal observers to re-read.
    fn clear(&self) -> Result<(), StoreError>;

    /// Current snapshot, or `None` when no valid timer is published.
    fn read(&self) -> Result<Option<TimerSnapshot>, StoreError>;

    /// Opaque token that changes on every write or clear.
    fn refresh_token(&self) -> Result<Option<String>, StoreError>;
}

impl<T: SharedStatePort + ?Sized> SharedStatePort for &T {
    fn write(&self, snapshot: &TimerSnapshot) -> Result<(), StoreError> {
        (**self).write(snapshot)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }

    fn read(&self) -> Result<Option<TimerSnapshot>, StoreError> {
        (**self).read()
    }

    fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        (**self).refresh_token()
    }
}

/// [`SharedStatePort`] over any [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct SharedState<S> {
    store: S,
}

impl<S: KeyValueStore> SharedState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True if any snapshot data is present, valid or not.
    pub fn has_active_timer(&self) -> Result<bool, StoreError> {
        Ok(!self.store.load(&[REMAINING_TIME_KEY])?.is_empty())
    }
}

impl<S: KeyValueStore> SharedStatePort for SharedState<S> {
    fn write(&self, snapshot: &TimerSnapshot) -> Result<(), StoreError> {
        let batch = Batch::new()
            .set(REMAINING_TIME_KEY, ms_to_secs(snapshot.remaining_ms))
            .set(TOTAL_TIME_KEY, ms_to_secs(snapshot.total_ms))
            .set(LABEL_KEY, snapshot.label.as_str())
            .set(RUNNING_KEY, snapshot.running)
            .set(LAST_UPDATED_KEY, snapshot.last_updated.to_rfc3339())
            .set(REFRESH_TOKEN_KEY, Uuid::new_v4().to_string());
        self.store.commit(batch)?;
        debug!(
            label = %snapshot.label,
            remaining_ms = snapshot.remaining_ms,
            running = snapshot.running,
            "shared state written"
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let batch = SNAPSHOT_KEYS
            .iter()
            .fold(Batch::new(), |b, key| b.remove(key))
            .set(REFRESH_TOKEN_KEY, Uuid::new_v4().to_string());
        self.store.commit(batch)?;
        debug!("shared state cleared");
        Ok(())
    }

    fn read(&self) -> Result<Option<TimerSnapshot>, StoreError> {
        let values = match self.store.load(&SNAPSHOT_KEYS) {
            Ok(values) => values,
            Err(StoreError::Codec { key, message }) => {
                warn!(%key, %message, "undecodable shared state, clearing");
                self.clear()?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if values.is_empty() {
            return Ok(None);
        }

        match decode_snapshot(&values) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(reason) => {
                warn!(%reason, "invalid shared state, clearing");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        let values = self.store.load(&[REFRESH_TOKEN_KEY])?;
        Ok(values
            .get(REFRESH_TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned))
    }
}

fn decode_snapshot(values: &HashMap<String, Value>) -> Result<TimerSnapshot, ValidationError> {
    let field = |key: &str| {
        values.get(key).ok_or_else(|| ValidationError::InvalidValue {
            field: key.to_string(),
            message: "missing".into(),
        })
    };
    let seconds = |key: &str| -> Result<u64, ValidationError> {
        field(key)?
            .as_f64()
            .and_then(secs_to_ms)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: key.to_string(),
                message: "expected non-negative seconds".into(),
            })
    };

    let remaining_ms = seconds(REMAINING_TIME_KEY)?;
    let total_ms = seconds(TOTAL_TIME_KEY)?;

    let label = field(LABEL_KEY)?
        .as_str()
        .ok_or_else(|| ValidationError::InvalidValue {
            field: LABEL_KEY.into(),
            message: "expected string".into(),
        })?;

    let running = field(RUNNING_KEY)?
        .as_bool()
        .ok_or_else(|| ValidationError::InvalidValue {
            field: RUNNING_KEY.into(),
            message: "expected bool".into(),
        })?;

    let last_updated = field(LAST_UPDATED_KEY)?
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: LAST_UPDATED_KEY.into(),
            message: "expected RFC 3339 timestamp".into(),
        })?;

    let snapshot = TimerSnapshot {
        remaining_ms,
        total_ms,
        label: label.to_string(),
        running,
        last_updated,
    };
    if !snapshot.is_valid() {
        return Err(ValidationError::InvalidValue {
            field: "snapshot".into(),
            message: "empty label or zero total".into(),
        });
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn snapshot() -> TimerSnapshot {
        TimerSnapshot {
            remaining_ms: 42_500,
            total_ms: 45_000,
            label: "HIIT".into(),
            running: true,
            last_updated: "2025-07-31T09:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn write_then_read_returns_snapshot() {
        let shared = SharedState::new(MemoryStore::new());
        shared.write(&snapshot()).unwrap();
        assert_eq!(shared.read().unwrap(), Some(snapshot()));
        assert_eq!(shared.store().get_raw(REMAINING_TIME_KEY), Some(json!(42.5)));
    }

    #[test]
    fn clear_removes_snapshot_keys() {
        let shared = SharedState::new(MemoryStore::new());
        shared.write(&snapshot()).unwrap();
        shared.clear().unwrap();
        assert_eq!(shared.read().unwrap(), None);
        assert!(!shared.has_active_timer().unwrap());
        assert!(shared.store().get_raw(REMAINING_TIME_KEY).is_none());
    }

    #[test]
    fn refresh_token_changes_on_every_write_and_clear() {
        let shared = SharedState::new(MemoryStore::new());
        assert_eq!(shared.refresh_token().unwrap(), None);
        shared.write(&snapshot()).unwrap();
        let first = shared.refresh_token().unwrap();
        shared.write(&snapshot()).unwrap();
        let second = shared.refresh_token().unwrap();
        shared.clear().unwrap();
        let third = shared.refresh_token().unwrap();
        assert!(first.is_some());
        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[test]
    fn partial_write_is_treated_as_absent_and_cleared() {
        let store = MemoryStore::new();
        store.put_raw(REMAINING_TIME_KEY, json!(10.0));
        store.put_raw(LABEL_KEY, json!("Tea"));
        let shared = SharedState::new(store.clone());
        assert_eq!(shared.read().unwrap(), None);
        assert!(store.get_raw(REMAINING_TIME_KEY).is_none());
        assert!(store.get_raw(LABEL_KEY).is_none());
    }

    #[test]
    fn zero_total_is_rejected() {
        let shared = SharedState::new(MemoryStore::new());
        let mut snap = snapshot();
        snap.total_ms = 0;
        shared.write(&snap).unwrap();
        assert_eq!(shared.read().unwrap(), None);
        assert!(!shared.has_active_timer().unwrap());
    }

    #[test]
    fn negative_remaining_is_rejected() {
        let store = MemoryStore::new();
        let shared = SharedState::new(store.clone());
        shared.write(&snapshot()).unwrap();
        store.put_raw(REMAINING_TIME_KEY, json!(-3.0));
        assert_eq!(shared.read().unwrap(), None);
    }

    #[test]
    fn empty_label_is_rejected() {
        let shared = SharedState::new(MemoryStore::new());
        let mut snap = snapshot();
        snap.label = String::new();
        shared.write(&snap).unwrap();
        assert_eq!(shared.read().unwrap(), None);
    }

    #[test]
    fn mistyped_running_flag_is_rejected() {
        let store = MemoryStore::new();
        let shared = SharedState::new(store.clone());
        shared.write(&snapshot()).unwrap();
        store.put_raw(RUNNING_KEY, json!("yes"));
        assert_eq!(shared.read().unwrap(), None);
    }
}
