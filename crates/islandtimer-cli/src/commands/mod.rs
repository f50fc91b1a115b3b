pub mod ambient;
pub mod config;
pub mod preset;
pub mod stopwatch;
pub mod timer;
pub mod widget;

use islandtimer_core::{Config, SharedState, SqliteStore, TimerSnapshot};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the shared store configured in `config.toml`.
pub fn open_shared(config: &Config) -> Result<SharedState<SqliteStore>, Box<dyn std::error::Error>> {
    Ok(SharedState::new(SqliteStore::open_default(config)?))
}

/// Current-thread runtime for the long-running loops. The store connection
/// is not `Sync`, so everything stays on one thread.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// One-line rendering: `[label] MM:SS ########---- 42%`.
pub fn render_line(label: &str, formatted: &str, progress: f64, running: bool) -> String {
    const WIDTH: usize = 20;
    let filled = ((progress.clamp(0.0, 1.0)) * WIDTH as f64).round() as usize;
    let bar: String = "#".repeat(filled) + &"-".repeat(WIDTH - filled);
    let marker = if running { "" } else { " (paused)" };
    format!(
        "[{label}] {formatted} {bar} {:>3.0}%{marker}",
        progress * 100.0
    )
}

pub fn snapshot_json(snapshot: Option<&TimerSnapshot>) -> serde_json::Value {
    match snapshot {
        Some(s) => serde_json::json!({
            "active": true,
            "label": s.label,
            "remaining_ms": s.remaining_ms,
            "total_ms": s.total_ms,
            "running": s.running,
            "progress": s.progress(),
            "formatted": s.formatted_time(),
            "last_updated": s.last_updated.to_rfc3339(),
        }),
        None => serde_json::json!({ "active": false }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_line_fills_bar_by_progress() {
        let line = render_line("Tea", "01:30", 0.5, true);
        assert_eq!(line, "[Tea] 01:30 ##########----------  50%");
        assert!(render_line("Tea", "01:30", 0.5, false).ends_with("(paused)"));
    }

    #[test]
    fn idle_snapshot_json() {
        assert_eq!(snapshot_json(None)["active"], false);
    }
}
