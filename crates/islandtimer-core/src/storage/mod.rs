mod config;
pub mod kv;
pub mod shared;
pub mod sqlite;

pub use config::{AmbientConfig, Config, HapticsConfig, StoreConfig, TimerConfig, WidgetConfig};
pub use kv::{Batch, KeyValueStore, MemoryStore};
pub use shared::{SharedState, SharedStatePort};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

/// Returns the data directory.
///
/// `ISLANDTIMER_DATA_DIR` wins when set. Otherwise `~/.config/islandtimer`,
/// or `~/.config/islandtimer-dev` with `ISLANDTIMER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("ISLANDTIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("ISLANDTIMER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("islandtimer-dev")
            } else {
                base_dir.join("islandtimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
