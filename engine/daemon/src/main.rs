//! Pet Engine - Host Tick Driver
//!
//! Runs the evolution engine against a simulated pet body and keeps the
//! save file up to date.
//!
//! # Usage
//!
//! ```bash
//! # Fast-forward a day in five-second ticks
//! pet-engine simulate --ticks 17280 --tick-secs 5
//!
//! # Real-time loop; type feed / play / click / trick / sleep / wake /
//! # status / evolve / save / quit on stdin
//! pet-engine run
//!
//! # Print the evolution status of the saved pet
//! pet-engine status
//!
//! # Verbose logging
//! RUST_LOG=debug pet-engine run
//! ```

mod host;
mod pet;
mod storage;

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use pet_engine_core::{
    load_config_with_override, Clock, EngineConfig, EvolutionEventKind, ManualClock, SharedClock,
    SystemClock,
};

use host::{Command, Host, TickReport};

/// Pet Engine - evolution and care tracking for a desktop pet
#[derive(Parser, Debug)]
#[command(name = "pet-engine")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Save file path
    #[arg(short = 's', long, global = true, env = "PET_ENGINE_SAVE", value_name = "FILE")]
    save: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long, global = true, env = "PET_ENGINE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, env = "PET_ENGINE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Fast-forward on a simulated clock
    Simulate {
        /// Number of ticks
        #[arg(long, default_value_t = 720)]
        ticks: u64,

        /// Simulated seconds per tick
        #[arg(long, default_value_t = 5)]
        tick_secs: u32,
    },

    /// Real-time loop reading commands from stdin
    Run {
        /// Seconds between ticks
        #[arg(long, default_value_t = 1)]
        tick_secs: u32,

        /// Start evolutions as soon as they are ready
        #[arg(long)]
        auto_evolve: bool,
    },

    /// Print the saved pet's evolution status as JSON
    Status,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "pet_engine_daemon={level},pet_engine_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn print_report(report: &TickReport) -> Result<()> {
    if !report.status_changed {
        return Ok(());
    }
    print_json(report)
}

// =============================================================================
// Modes
// =============================================================================

fn simulate(
    config: &EngineConfig,
    save_path: &std::path::Path,
    ticks: u64,
    tick_secs: u32,
) -> Result<()> {
    let clock = ManualClock::at(SystemClock.now());
    let save = storage::load(save_path, clock.now())?;
    let mut host = Host::new(save, config, clock.shared(), true);

    info!(ticks, tick_secs, "Simulation starting");
    let mut evolutions = 0_usize;
    for _ in 0..ticks {
        clock.advance_secs(i64::from(tick_secs));
        let report = host.tick();
        evolutions += report
            .events
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    EvolutionEventKind::Complete | EvolutionEventKind::SpecialComplete
                )
            })
            .count();
        print_report(&report)?;
    }

    let status = host.integrator().evolution_status();
    info!(
        form_id = host.integrator().manager().current_form_id(),
        level = status.level,
        evolutions,
        "Simulation finished"
    );
    print_json(&status)?;

    storage::write(save_path, &host.save_data())
}

fn status(config: &EngineConfig, save_path: &std::path::Path) -> Result<()> {
    let clock: SharedClock = SystemClock::shared();
    let save = storage::load(save_path, clock.now())?;
    if save.is_none() {
        warn!(path = ?save_path, "No save found, showing a fresh pet");
    }
    let host = Host::new(save, config, clock, false);
    print_json(&host.integrator().evolution_status())
}

async fn run(
    config: &EngineConfig,
    save_path: PathBuf,
    tick_secs: u32,
    auto_evolve: bool,
) -> Result<()> {
    let clock: SharedClock = SystemClock::shared();
    let save = storage::load(&save_path, clock.now())?;
    let host = Arc::new(Mutex::new(Host::new(save, config, clock, auto_evolve)));

    // Tick task
    let tick_host = Arc::clone(&host);
    let tick_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(StdDuration::from_secs(u64::from(tick_secs.max(1))));
        loop {
            interval.tick().await;
            let report = tick_host.lock().tick();
            if let Err(e) = print_report(&report) {
                error!(error = %e, "Failed to print tick report");
            }
        }
    });

    info!(path = ?save_path, "Pet engine running; type a command or Ctrl-C to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if dispatch_line(&host, &line, &save_path).is_break() {
                    break;
                }
            }
        }
    }

    tick_task.abort();
    let save = host.lock().save_data();
    storage::write(&save_path, &save)?;
    info!(path = ?save_path, "Saved");
    Ok(())
}

/// Run one line of stdin input; `Break` on quit
///
/// Command failures are logged and the loop keeps going.
fn dispatch_line(host: &Mutex<Host>, line: &str, save_path: &std::path::Path) -> ControlFlow<()> {
    if line.trim().is_empty() {
        return ControlFlow::Continue(());
    }
    match line.parse::<Command>() {
        Ok(Command::Quit) => return ControlFlow::Break(()),
        Ok(command) => {
            if let Err(e) = handle_command(host, command, save_path) {
                warn!(error = %e, input = %line.trim(), "Command failed");
            }
        }
        Err(e) => warn!(input = %line.trim(), "{e}"),
    }
    ControlFlow::Continue(())
}

fn handle_command(host: &Mutex<Host>, command: Command, save_path: &std::path::Path) -> Result<()> {
    let mut host = host.lock();
    match command {
        Command::Interact(interaction) => {
            let xp = host.interact(interaction);
            info!(interaction = %interaction, xp, "Interaction");
        }
        Command::Status => {
            let stats = host.body().stats();
            info!(
                hunger = stats.hunger,
                happiness = stats.happiness,
                energy = stats.energy,
                sleeping = host.body().is_sleeping(),
                "Pet stats"
            );
            print_json(&host.integrator().evolution_status())?;
        }
        Command::Evolve => {
            if let Some(event) = host.start_evolution() {
                print_json(&event)?;
            }
        }
        Command::Save => storage::write(save_path, &host.save_data())?,
        Command::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!("Pet Engine starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = load_config_with_override(args.config.clone()).context("Failed to load config")?;
    config.validate().context("Invalid config")?;
    info!(source = ?config.source(), path = ?config.config_file_path, "Config loaded");

    let save_path = args.save.unwrap_or_else(storage::default_save_path);

    match args.command {
        Mode::Simulate { ticks, tick_secs } => simulate(&config, &save_path, ticks, tick_secs),
        Mode::Run {
            tick_secs,
            auto_evolve,
        } => run(&config, save_path, tick_secs, auto_evolve).await,
        Mode::Status => status(&config, &save_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> Mutex<Host> {
        let clock = ManualClock::new();
        Mutex::new(Host::new(None, &EngineConfig::default(), clock.shared(), false))
    }

    #[test]
    fn test_failed_save_keeps_loop_running() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let save_path = blocker.join("save.json");
        let host = host();

        assert!(handle_command(&host, Command::Save, &save_path).is_err());
        assert_eq!(dispatch_line(&host, "save", &save_path), ControlFlow::Continue(()));
        assert_eq!(dispatch_line(&host, "feed", &save_path), ControlFlow::Continue(()));
        assert!(host.lock().integrator().manager().total_xp() > 0);
    }

    #[test]
    fn test_quit_and_noise_lines() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("save.json");
        let host = host();

        assert_eq!(dispatch_line(&host, "   ", &save_path), ControlFlow::Continue(()));
        assert_eq!(dispatch_line(&host, "juggle", &save_path), ControlFlow::Continue(()));
        assert_eq!(dispatch_line(&host, "quit", &save_path), ControlFlow::Break(()));
        assert!(!save_path.exists());
    }

    #[test]
    fn test_save_command_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("save.json");
        let host = host();

        assert_eq!(dispatch_line(&host, "save", &save_path), ControlFlow::Continue(()));
        assert!(save_path.exists());
    }
}
