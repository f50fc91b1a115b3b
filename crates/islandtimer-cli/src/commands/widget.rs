use std::time::Duration;

use clap::Subcommand;
use islandtimer_core::{Activation, Clock, Config, SystemClock, Timeline, WidgetProvider};
use tracing::debug;

use super::{open_shared, render_line, runtime, CliResult};

/// How often `widget watch` checks the refresh token.
const INVALIDATION_POLL: Duration = Duration::from_millis(250);

#[derive(Subcommand)]
pub enum WidgetAction {
    /// Print the current timeline as JSON
    Timeline,
    /// Render the widget in the terminal until Ctrl-C
    Watch {
        /// Exit after this many renders
        #[arg(long)]
        count: Option<usize>,
    },
}

pub fn run(action: WidgetAction) -> CliResult {
    let config = Config::load_or_default();
    let mut provider = WidgetProvider::new(open_shared(&config)?, SystemClock, config.widget.clone());
    match action {
        WidgetAction::Timeline => {
            let timeline = provider.timeline();
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        }
        WidgetAction::Watch { count } => {
            runtime()?.block_on(async move {
                let mut renders = 0usize;
                let mut current = provider.timeline();
                render(&current);
                renders += 1;

                let mut poll = tokio::time::interval(INVALIDATION_POLL);
                let ctrl_c = tokio::signal::ctrl_c();
                tokio::pin!(ctrl_c);

                while count.map_or(true, |limit| renders < limit) {
                    let until_refresh = (current.refresh_at - SystemClock.now())
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    let next = tokio::select! {
                        _ = tokio::time::sleep(until_refresh) => provider.activate(Activation::Scheduled),
                        _ = poll.tick() => provider.activate(Activation::Invalidated),
                        _ = &mut ctrl_c => break,
                    };
                    if let Some(timeline) = next {
                        debug!(entries = timeline.entries.len(), "widget reloaded");
                        current = timeline;
                        render(&current);
                        renders += 1;
                    }
                }
            });
        }
    }
    Ok(())
}

fn render(timeline: &Timeline) {
    let Some(entry) = timeline.entries.first() else {
        return;
    };
    if entry.total_ms == 0 {
        println!("[{}] idle", entry.label);
    } else {
        println!(
            "{}",
            render_line(&entry.label, &entry.formatted_time(), entry.progress(), entry.running)
        );
    }
}
