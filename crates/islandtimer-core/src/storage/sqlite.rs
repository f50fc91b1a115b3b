//! SQLite-backed shared namespace.
//!
//! Every actor opens its own connection to the same database file, which is
//! what lets a controller process and observer processes see each other's
//! writes. Values are stored as JSON text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::config::Config;
use super::data_dir;
use super::kv::{Batch, KeyValueStore};
use crate::error::StoreError;

pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the shared database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        conn.busy_timeout(Duration::from_millis(500))?;
        let store = Self {
            conn,
            path: Some(path),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open `<data_dir>/<store.file_name>`.
    pub fn open_default(config: &Config) -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::DataDir(e.to_string()))?;
        Self::open(dir.join(&config.store.file_name))
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, path: None };
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }
}

impl KeyValueStore for SqliteStore {
    fn load(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        // One read transaction so a concurrent writer cannot tear the result.
        let tx = self.conn.unchecked_transaction()?;
        let mut values = HashMap::new();
        {
            let mut stmt = tx.prepare_cached("SELECT value FROM kv WHERE key = ?1")?;
            for key in keys {
                let raw: Option<String> = stmt
                    .query_row(params![key], |row| row.get(0))
                    .optional()?;
                if let Some(raw) = raw {
                    let value = serde_json::from_str(&raw).map_err(|e| StoreError::Codec {
                        key: key.to_string(),
                        message: e.to_string(),
                    })?;
                    values.insert(key.to_string(), value);
                }
            }
        }
        tx.commit()?;
        Ok(values)
    }

    fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut delete = tx.prepare_cached("DELETE FROM kv WHERE key = ?1")?;
            for key in &batch.remove {
                delete.execute(params![key])?;
            }
            let mut upsert =
                tx.prepare_cached("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            for (key, value) in &batch.set {
                let raw = serde_json::to_string(value).map_err(|e| StoreError::Codec {
                    key: key.clone(),
                    message: e.to_string(),
                })?;
                upsert.execute(params![key, raw])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
