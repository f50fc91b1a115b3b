use std::time::Duration;

use clap::Subcommand;
use islandtimer_core::observer::{
    ActivityAttributes, ActivityContent, ActivityError, ActivityHost, ActivityId,
};
use islandtimer_core::timer::snapshot::{format_clock, progress};
use islandtimer_core::{AmbientActivity, Config};
use tracing::warn;

use super::{open_shared, render_line, runtime, CliResult};

#[derive(Subcommand)]
pub enum AmbientAction {
    /// Mirror the shared timer as an ambient activity until Ctrl-C
    Watch {
        /// Exit after this many sync passes
        #[arg(long)]
        count: Option<usize>,
    },
}

/// Renders activities as status lines on stdout.
struct TerminalActivityHost {
    enabled: bool,
    next_id: u64,
    live: Option<ActivityId>,
}

impl ActivityHost for TerminalActivityHost {
    fn activities_enabled(&self) -> bool {
        self.enabled
    }

    fn request(
        &mut self,
        attributes: &ActivityAttributes,
        _content: &ActivityContent,
    ) -> Result<ActivityId, ActivityError> {
        if !self.enabled {
            return Err(ActivityError::Disabled);
        }
        self.next_id += 1;
        let id = ActivityId(format!("ambient-{}", self.next_id));
        println!(
            "activity started: {} ({})",
            attributes.label,
            format_clock(attributes.total_ms)
        );
        self.live = Some(id.clone());
        Ok(id)
    }

    fn update(&mut self, id: &ActivityId, content: &ActivityContent) -> Result<(), ActivityError> {
        if self.live.as_ref() != Some(id) {
            return Err(ActivityError::NotFound(id.clone()));
        }
        println!(
            "{}",
            render_line(
                &content.label,
                &format_clock(content.remaining_ms),
                progress(content.remaining_ms, content.total_ms),
                content.running,
            )
        );
        Ok(())
    }

    fn end(&mut self, id: &ActivityId) -> Result<(), ActivityError> {
        if self.live.take().as_ref() != Some(id) {
            return Err(ActivityError::NotFound(id.clone()));
        }
        println!("activity ended");
        Ok(())
    }
}

pub fn run(action: AmbientAction) -> CliResult {
    let config = Config::load_or_default();
    match action {
        AmbientAction::Watch { count } => {
            if !config.ambient.enabled {
                warn!("ambient activities disabled in config; nothing to mirror");
                return Ok(());
            }
            let host = TerminalActivityHost {
                enabled: config.ambient.enabled,
                next_id: 0,
                live: None,
            };
            let mut ambient = AmbientActivity::new(host, open_shared(&config)?);
            let period = Duration::from_millis(config.ambient.update_interval_ms.max(1));

            runtime()?.block_on(async move {
                let mut ticker = tokio::time::interval(period);
                let ctrl_c = tokio::signal::ctrl_c();
                tokio::pin!(ctrl_c);
                let mut passes = 0usize;

                while count.map_or(true, |limit| passes < limit) {
                    tokio::select! {
                        _ = ticker.tick() => {
                            ambient.sync();
                            passes += 1;
                        }
                        _ = &mut ctrl_c => break,
                    }
                }
                ambient.end();
            });
        }
    }
    Ok(())
}
