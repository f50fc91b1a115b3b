//! Timer presets: the built-in set plus user-defined custom presets.

mod store;

pub use store::{PresetStore, PRESET_SCHEMA_VERSION};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Display color attached to a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Orange,
    Red,
    Green,
    #[default]
    Blue,
    Purple,
    Yellow,
    Pink,
    Teal,
}

impl ColorTag {
    pub const ALL: [ColorTag; 8] = [
        ColorTag::Orange,
        ColorTag::Red,
        ColorTag::Green,
        ColorTag::Blue,
        ColorTag::Purple,
        ColorTag::Yellow,
        ColorTag::Pink,
        ColorTag::Teal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorTag::Orange => "orange",
            ColorTag::Red => "red",
            ColorTag::Green => "green",
            ColorTag::Blue => "blue",
            ColorTag::Purple => "purple",
            ColorTag::Yellow => "yellow",
            ColorTag::Pink => "pink",
            ColorTag::Teal => "teal",
        }
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ColorTag::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "color".into(),
                message: format!("unknown color '{s}'"),
            })
    }
}

/// An immutable named duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: Uuid,
    pub name: String,
    pub duration_ms: u64,
    pub color: ColorTag,
}

impl Preset {
    /// Validate and build a preset with a fresh id.
    pub fn new(
        name: impl Into<String>,
        duration_ms: u64,
        color: ColorTag,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name".into()));
        }
        if duration_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: "must be positive".into(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            duration_ms,
            color,
        })
    }

    /// Fixed built-in presets.
    pub fn builtin() -> Vec<Preset> {
        vec![
            builtin("Noodles", 3 * 60, ColorTag::Orange),
            builtin("Pomodoro", 25 * 60, ColorTag::Red),
            builtin("HIIT", 45, ColorTag::Green),
        ]
    }
}

fn builtin(name: &str, secs: u64, color: ColorTag) -> Preset {
    Preset {
        id: Uuid::new_v4(),
        name: name.into(),
        duration_ms: secs * 1000,
        color,
    }
}

/// Case-insensitive lookup; built-ins shadow custom presets of the same name.
pub fn find_preset(name: &str, custom: &[Preset]) -> Option<Preset> {
    let name = name.trim();
    Preset::builtin()
        .into_iter()
        .chain(custom.iter().cloned())
        .find(|p| p.name.eq_ignore_ascii_case(name))
}
