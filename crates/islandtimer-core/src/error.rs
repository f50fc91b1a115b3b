//! Error types for islandtimer-core.
//!
//! Store failures are never fatal to the controller: they are logged and the
//! countdown keeps running. Preset and configuration persistence surface
//! their errors to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Shared state store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open shared store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Another process holds the write lock
    #[error("Shared store is locked")]
    Locked,

    /// A stored value could not be encoded or decoded
    #[error("Failed to encode value for '{key}': {message}")]
    Codec { key: String, message: String },

    /// The data directory could not be resolved
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Custom preset persistence errors.
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Failed to read/write presets file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse presets TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize presets TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unsupported presets schema version {found} (latest known is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Invalid preset: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Preset index {index} out of range (length: {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Field must not be empty
    #[error("Field '{0}' must not be empty")]
    EmptyField(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked
                    || code.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_database_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(StoreError::from(err), StoreError::Locked));
    }

    #[test]
    fn unsupported_version_message_names_both_versions() {
        let err = PresetError::UnsupportedVersion {
            found: 7,
            supported: 1,
        };
        assert!(err.to_string().contains("7"));
        assert!(err.to_string().contains("1"));
    }
}
