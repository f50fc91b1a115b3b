use clap::Subcommand;
use islandtimer_core::timer::snapshot::{format_clock, secs_to_ms};
use islandtimer_core::{
    find_preset, Config, DeviceEffects, Event, IntervalScheduler, PresetStore, Recovery,
    SharedState, SharedStatePort, SqliteStore, StalenessValidator, SystemClock, TickScheduler,
    TimerController, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{open_shared, render_line, runtime, snapshot_json, CliResult};

type Controller = TimerController<SharedState<SqliteStore>, IntervalScheduler, Bell, SystemClock>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown in the foreground.
    ///
    /// Reads `pause`, `resume`, `stop` and `status` lines from stdin while
    /// running. Ctrl-C stops the timer.
    Run {
        /// Preset name (built-in or custom)
        #[arg(required_unless_present = "custom")]
        preset: Option<String>,
        /// Ad-hoc duration in seconds instead of a preset
        #[arg(long, conflicts_with = "preset")]
        custom: Option<f64>,
        /// Label for an ad-hoc countdown
        #[arg(long, default_value = "Timer", requires = "custom")]
        label: String,
    },
    /// Pick up a timer left behind by a previous process
    Recover,
    /// Print the published shared state as JSON
    Status,
    /// Clear the shared state
    Clear,
}

/// Terminal bell on completion; `haptics.enabled = false` silences it.
struct Bell {
    enabled: bool,
}

impl DeviceEffects for Bell {
    fn completion_alert(&self, label: &str) {
        if self.enabled {
            eprint!("\x07");
        }
        info!(%label, "countdown finished");
    }
}

fn controller(config: &Config) -> Result<Controller, Box<dyn std::error::Error>> {
    let port = open_shared(config)?;
    let bell = Bell {
        enabled: config.haptics.enabled,
    };
    Ok(
        TimerController::new(port, IntervalScheduler::new(), bell, SystemClock)
            .with_tick_interval(config.timer.tick_interval())
            .with_validator(StalenessValidator::new(config.timer.stale_after())),
    )
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load_or_default();
    match action {
        TimerAction::Run {
            preset,
            custom,
            label,
        } => {
            let port = open_shared(&config)?;
            let validator = StalenessValidator::new(config.timer.stale_after());
            match validator.validate(&port, &SystemClock)? {
                Recovery::Resume(snapshot) | Recovery::Paused(snapshot) => {
                    return Err(format!(
                        "timer \"{}\" is already active; use `timer recover` or `timer clear`",
                        snapshot.label
                    )
                    .into());
                }
                Recovery::Nothing | Recovery::Cleared(_) => {}
            }
            drop(port);

            let mut controller = controller(&config)?;
            let started = match (preset, custom) {
                (_, Some(secs)) => {
                    let ms = secs_to_ms(secs)
                        .ok_or("custom duration must be a non-negative number of seconds")?;
                    controller.start_custom(&label, ms)?
                }
                (Some(name), None) => {
                    let custom_presets = PresetStore::open()?.load_all()?;
                    let preset = find_preset(&name, &custom_presets)
                        .ok_or_else(|| format!("unknown preset: {name}"))?;
                    controller.start(&preset)
                }
                (None, None) => return Err("a preset name or --custom is required".into()),
            };
            if let Some(event) = started {
                emit(&event)?;
            }
            runtime()?.block_on(drive(&mut controller))?;
        }
        TimerAction::Recover => {
            let mut controller = controller(&config)?;
            match controller.restore() {
                Some(event) => emit(&event)?,
                None => {
                    println!("no timer to recover");
                    return Ok(());
                }
            }
            if controller.state().is_active() {
                if controller.state() == TimerState::Paused {
                    eprintln!("timer is paused; type `resume` to continue");
                }
                runtime()?.block_on(drive(&mut controller))?;
            }
        }
        TimerAction::Status => {
            let port = open_shared(&config)?;
            let snapshot = port.read()?;
            println!("{}", serde_json::to_string_pretty(&snapshot_json(snapshot.as_ref()))?);
        }
        TimerAction::Clear => {
            let port = open_shared(&config)?;
            port.clear()?;
            println!("shared state cleared");
        }
    }
    Ok(())
}

fn emit(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

/// Host loop: ticks while the scheduler is armed, applies stdin commands
/// and stops on Ctrl-C. Returns once the run is terminal, or when stdin
/// closes while nothing is ticking.
async fn drive(controller: &mut Controller) -> Result<(), Box<dyn std::error::Error>> {
    let period = controller.tick_interval();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.reset();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let armed = controller.scheduler().is_armed();
        tokio::select! {
            _ = ticker.tick(), if armed => {
                match controller.tick() {
                    Some(event) => emit(&event)?,
                    None => eprintln!(
                        "{}",
                        render_line(
                            controller.label(),
                            &format_clock(controller.remaining_ms()),
                            controller.progress(),
                            true,
                        )
                    ),
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let was_armed = controller.scheduler().is_armed();
                    apply_command(controller, line.trim())?;
                    if !was_armed && controller.scheduler().is_armed() {
                        ticker.reset();
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => {
                if let Some(event) = controller.stop() {
                    emit(&event)?;
                }
            }
        }

        if controller.state().is_terminal() {
            break;
        }
        if !stdin_open && !controller.scheduler().is_armed() {
            info!("paused with no input; leaving snapshot for `timer recover`");
            break;
        }
    }
    Ok(())
}

fn apply_command(controller: &mut Controller, command: &str) -> Result<(), serde_json::Error> {
    let event = match command {
        "" => return Ok(()),
        "pause" | "p" => controller.pause(),
        "resume" | "r" => controller.resume(),
        "stop" | "s" => controller.stop(),
        "status" => Some(controller.snapshot()),
        other => {
            eprintln!("unknown command: {other} (pause, resume, stop, status)");
            return Ok(());
        }
    };
    match event {
        Some(event) => emit(&event),
        None => {
            eprintln!("`{command}` has no effect while {:?}", controller.state());
            Ok(())
        }
    }
}
