use clap::Subcommand;
use islandtimer_core::timer::snapshot::secs_to_ms;
use islandtimer_core::timer::STOPWATCH_TICK;
use islandtimer_core::Stopwatch;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::warn;

use super::{runtime, CliResult};

#[derive(Subcommand)]
pub enum StopwatchAction {
    /// Run the stopwatch in the foreground.
    ///
    /// Reads `pause`, `resume` and `stop` lines from stdin. Prints the
    /// final reading on exit.
    Run {
        /// Stop automatically after this many seconds of running time
        #[arg(long = "for")]
        limit: Option<f64>,
    },
}

pub fn run(action: StopwatchAction) -> CliResult {
    match action {
        StopwatchAction::Run { limit } => {
            let limit_ms = match limit {
                Some(secs) => Some(
                    secs_to_ms(secs).ok_or("--for must be a non-negative number of seconds")?,
                ),
                None => None,
            };
            let reading = runtime()?.block_on(drive(limit_ms));
            println!("{reading}");
        }
    }
    Ok(())
}

async fn drive(limit_ms: Option<u64>) -> String {
    let mut stopwatch = Stopwatch::new();
    stopwatch.start();

    let mut ticker = tokio::time::interval(STOPWATCH_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    ticker.reset();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let running = stopwatch.is_running();
        tokio::select! {
            _ = ticker.tick(), if running => {
                stopwatch.tick(STOPWATCH_TICK);
                if stopwatch.elapsed_ms() % 1000 == 0 {
                    eprintln!("{}", stopwatch.formatted());
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "pause" | "p" => {
                        stopwatch.pause();
                    }
                    "resume" | "r" => {
                        if stopwatch.resume() {
                            ticker.reset();
                        }
                    }
                    "stop" | "s" => break,
                    "" => {}
                    other => eprintln!("unknown command: {other} (pause, resume, stop)"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => break,
        }

        if limit_ms.is_some_and(|limit| stopwatch.elapsed_ms() >= limit) {
            break;
        }
        if !stdin_open && !stopwatch.is_running() {
            break;
        }
    }

    let reading = stopwatch.formatted();
    stopwatch.stop();
    reading
}
