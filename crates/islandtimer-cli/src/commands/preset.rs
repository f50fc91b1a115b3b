use clap::Subcommand;
use islandtimer_core::timer::snapshot::{format_clock, secs_to_ms};
use islandtimer_core::{ColorTag, Preset, PresetStore};

use super::CliResult;

#[derive(Subcommand)]
pub enum PresetAction {
    /// List built-in and custom presets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a custom preset
    Add {
        /// Preset name
        name: String,
        /// Duration in seconds
        #[arg(long)]
        secs: f64,
        /// Color tag (red, orange, yellow, green, teal, blue, purple, pink)
        #[arg(long, default_value = "blue")]
        color: ColorTag,
    },
    /// Remove a custom preset by its index in `preset list`
    Remove {
        index: usize,
    },
}

pub fn run(action: PresetAction) -> CliResult {
    let store = PresetStore::open()?;
    match action {
        PresetAction::List { json } => {
            let builtin = Preset::builtin();
            let custom = store.load_all()?;
            if json {
                let value = serde_json::json!({
                    "builtin": builtin,
                    "custom": custom,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }
            println!("Built-in:");
            for preset in &builtin {
                println!("  {:<12} {}  {}", preset.name, format_clock(preset.duration_ms), preset.color);
            }
            println!("Custom:");
            if custom.is_empty() {
                println!("  (none)");
            }
            for (i, preset) in custom.iter().enumerate() {
                println!(
                    "  [{i}] {:<12} {}  {}",
                    preset.name,
                    format_clock(preset.duration_ms),
                    preset.color
                );
            }
        }
        PresetAction::Add { name, secs, color } => {
            let duration_ms =
                secs_to_ms(secs).ok_or("duration must be a non-negative number of seconds")?;
            let preset = Preset::new(name, duration_ms, color)?;
            let all = store.add(preset)?;
            println!("preset saved ({} custom)", all.len());
        }
        PresetAction::Remove { index } => {
            let removed = store.remove(index)?;
            println!("removed preset: {}", removed.name);
        }
    }
    Ok(())
}
