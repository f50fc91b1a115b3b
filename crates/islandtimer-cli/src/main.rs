use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "islandtimer", version, about = "IslandTimer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Countdown control (the primary controller)
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Built-in and custom presets
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Home-screen widget observer
    Widget {
        #[command(subcommand)]
        action: commands::widget::WidgetAction,
    },
    /// Ambient activity observer
    Ambient {
        #[command(subcommand)]
        action: commands::ambient::AmbientAction,
    },
    /// Count-up stopwatch
    Stopwatch {
        #[command(subcommand)]
        action: commands::stopwatch::StopwatchAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ISLANDTIMER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("islandtimer=info,islandtimer_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Widget { action } => commands::widget::run(action),
        Commands::Ambient { action } => commands::ambient::run(action),
        Commands::Stopwatch { action } => commands::stopwatch::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
