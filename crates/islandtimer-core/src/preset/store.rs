//! Custom preset persistence.
//!
//! Presets live in `presets.toml` with an explicit schema version:
//!
//! ```toml
//! schema_version = 1
//!
//! [[presets]]
//! id = "1c7f..."
//! name = "Tea"
//! duration_secs = 240.0
//! color = "teal"
//! ```
//!
//! Files without `schema_version` are the legacy layout (name and duration
//! only); they load with the default color and are rewritten as version 1
//! on the next save.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::{ColorTag, Preset};
use crate::error::PresetError;
use crate::storage::data_dir;
use crate::timer::snapshot::{ms_to_secs, secs_to_ms};

pub const PRESET_SCHEMA_VERSION: u32 = 1;

/// Storage for user presets. Not shared with observers.
pub struct PresetStore {
    path: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct PresetsFile {
    #[serde(default)]
    schema_version: u32,
    #[serde(default)]
    presets: Vec<PresetRecord>,
}

#[derive(Serialize, Deserialize)]
struct PresetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    name: String,
    duration_secs: f64,
    #[serde(default)]
    color: ColorTag,
}

impl PresetRecord {
    fn into_preset(self) -> Option<Preset> {
        let duration_ms = secs_to_ms(self.duration_secs)?;
        let mut preset = Preset::new(self.name, duration_ms, self.color).ok()?;
        if let Some(id) = self.id {
            preset.id = id;
        }
        Some(preset)
    }
}

impl From<&Preset> for PresetRecord {
    fn from(p: &Preset) -> Self {
        Self {
            id: Some(p.id),
            name: p.name.clone(),
            duration_secs: ms_to_secs(p.duration_ms),
            color: p.color,
        }
    }
}

impl PresetStore {
    /// Open the store at `<data_dir>/presets.toml`.
    pub fn open() -> Result<Self, PresetError> {
        let dir = data_dir().map_err(|e| PresetError::DataDir(e.to_string()))?;
        Ok(Self::with_path(dir.join("presets.toml")))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every custom preset. A missing file is an empty list; malformed
    /// entries are skipped.
    pub fn load_all(&self) -> Result<Vec<Preset>, PresetError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let file: PresetsFile = toml::from_str(&content)?;
        if file.schema_version > PRESET_SCHEMA_VERSION {
            return Err(PresetError::UnsupportedVersion {
                found: file.schema_version,
                supported: PRESET_SCHEMA_VERSION,
            });
        }

        let total = file.presets.len();
        let presets: Vec<Preset> = file
            .presets
            .into_iter()
            .filter_map(PresetRecord::into_preset)
            .collect();
        if presets.len() != total {
            warn!(
                skipped = total - presets.len(),
                path = %self.path.display(),
                "skipped malformed presets"
            );
        }
        Ok(presets)
    }

    /// Replace the stored list, always writing the current schema version.
    pub fn save_all(&self, presets: &[Preset]) -> Result<(), PresetError> {
        let file = PresetsFile {
            schema_version: PRESET_SCHEMA_VERSION,
            presets: presets.iter().map(PresetRecord::from).collect(),
        };
        let content = toml::to_string_pretty(&file)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn add(&self, preset: Preset) -> Result<Vec<Preset>, PresetError> {
        let mut presets = self.load_all()?;
        presets.push(preset);
        self.save_all(&presets)?;
        Ok(presets)
    }

    /// Remove the preset at `index` (list order) and return it.
    pub fn remove(&self, index: usize) -> Result<Preset, PresetError> {
        let mut presets = self.load_all()?;
        if index >= presets.len() {
            return Err(PresetError::OutOfRange {
                index,
                len: presets.len(),
            });
        }
        let removed = presets.remove(index);
        self.save_all(&presets)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PresetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::with_path(dir.path().join("presets.toml"));
        (dir, store)
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = store();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn add_persists_color_and_id() {
        let (_dir, store) = store();
        let tea = Preset::new("Tea", 240_000, ColorTag::Teal).unwrap();
        store.add(tea.clone()).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, vec![tea]);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("schema_version = 1"));
        assert!(raw.contains("color = \"teal\""));
    }

    #[test]
    fn legacy_file_loads_with_default_color() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(),
            "[[presets]]\nname = \"Eggs\"\nduration_secs = 420.0\n",
        )
        .unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Eggs");
        assert_eq!(loaded[0].duration_ms, 420_000);
        assert_eq!(loaded[0].color, ColorTag::Blue);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "schema_version = 9\n").unwrap();
        assert!(matches!(
            store.load_all(),
            Err(PresetError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(),
            "schema_version = 1\n\n[[presets]]\nname = \"\"\nduration_secs = 10.0\n\n[[presets]]\nname = \"Nap\"\nduration_secs = 1200.0\ncolor = \"purple\"\n",
        )
        .unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].color, ColorTag::Purple);
    }

    #[test]
    fn remove_by_index() {
        let (_dir, store) = store();
        store
            .add(Preset::new("A", 1_000, ColorTag::Red).unwrap())
            .unwrap();
        store
            .add(Preset::new("B", 2_000, ColorTag::Green).unwrap())
            .unwrap();

        let removed = store.remove(0).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(store.load_all().unwrap()[0].name, "B");
        assert!(matches!(
            store.remove(5),
            Err(PresetError::OutOfRange { index: 5, len: 1 })
        ));
    }
}
