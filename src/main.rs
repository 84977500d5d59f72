//! # Padmap
//!
//! Map gamepad input to keyboard and mouse events on Linux handhelds.
//!
//! Reads every connected controller, resolves buttons through the loaded
//! control profiles and writes the result to a virtual keyboard. With
//! `--xbox360` the controller is forwarded to a virtual Xbox 360 pad
//! instead.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use padmap::config::{atob, dump, Config, ConfigLoader};
use padmap::controller::{Controller, ControllerEvent};
use padmap::controls::Engine;
use padmap::output::{VirtualGamepad, VirtualKeyboard};
use padmap::process::PkillProcess;

/// Capacity of the merged controller event channel
const EVENT_CHANNEL_SIZE: usize = 256;

/// Per-user configuration file, loaded in config-only mode
const USER_CONFIG_FILE: &str = "padmap.ini";

/// Environment variable enabling the built-in text input profile
const TEXT_INPUT_ENV: &str = "TEXTINPUTINTERACTIVE";

/// Time allowed for reader tasks to release their devices on shutdown
const READER_SHUTDOWN_MS: u64 = 200;

#[derive(Parser, Debug)]
#[command(name = "padmap")]
#[command(version)]
#[command(about = "Map gamepad input to keyboard and mouse events", long_about = None)]
struct Cli {
    /// Control file to load (may be repeated)
    #[arg(short, long = "config", value_name = "FILE")]
    config: Vec<PathBuf>,

    /// Control profile to start in
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// Forward the controller as a generic Xbox 360 pad
    #[arg(short = 'x', long = "xbox360")]
    xbox360: bool,

    /// Game prefix selecting [config:<PREFIX>] sections
    #[arg(short, long, value_name = "PREFIX")]
    game: Option<String>,

    /// Process to terminate on start + hotkey
    #[arg(short, long, value_name = "PROCESS")]
    kill: Option<String>,

    /// Run the kill command through sudo
    #[arg(long)]
    sudo_kill: bool,

    /// Print the loaded configuration and exit
    #[arg(long)]
    dump: bool,

    /// Write a daily log file into this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Main entry point for Padmap
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging
///    - Load control files, then the per-user file
///    - Open every controller and start its reader task
///
/// 2. **Main Loop**
///    - Drain controller events into the engine
///    - Tick the engine for repeats and mouse motion
///    - Grab or release controllers when exclusive mode changes
///    - Stop on Ctrl+C or start + hotkey
///
/// 3. **Graceful Shutdown**
///    - Release held keys
///    - Ungrab every controller
///
/// # Errors
///
/// Returns error if a control file cannot be read, no controller is
/// found or the virtual device cannot be created.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli);

    info!("Padmap v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    if cli.dump {
        print!("{}", dump::render(&config)?);
        return Ok(());
    }

    let controllers = Controller::open_all().context("No usable controller")?;
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let (grab_tx, grab_rx) = watch::channel(false);

    let readers: Vec<JoinHandle<()>> = controllers
        .into_iter()
        .map(|controller| controller.spawn(event_tx.clone(), grab_rx.clone()))
        .collect();
    drop(event_tx);

    if cli.xbox360 {
        run_passthrough(event_rx).await?;
    } else {
        run_engine(&cli, config, event_rx, &grab_tx).await?;
    }

    drop(grab_tx);
    for reader in readers {
        if timeout(Duration::from_millis(READER_SHUTDOWN_MS), reader).await.is_err() {
            debug!("Controller reader did not stop in time");
        }
    }

    info!("Padmap stopped");
    Ok(())
}

/// Installs the tracing subscriber. The returned guard keeps the log file
/// writer alive.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "padmap.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

/// Loads the `-c` files, then the per-user file in config-only mode.
fn load_config(cli: &Cli) -> Result<Config> {
    let text_input = std::env::var(TEXT_INPUT_ENV)
        .map(|value| atob(&value, true))
        .unwrap_or(false);

    let mut loader = ConfigLoader::new().with_text_input(text_input);
    if let Some(prefix) = &cli.game {
        loader = loader.with_game_prefix(prefix.as_str());
    }

    for path in &cli.config {
        loader
            .load_file(path, false)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }

    if let Some(path) = dirs::config_dir().map(|dir| dir.join(USER_CONFIG_FILE)) {
        if path.exists() {
            if let Err(e) = loader.load_file(&path, true) {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    let mut config = loader.finish();
    if let Some(profile) = &cli.profile {
        config.settings.controls = profile.clone();
    }
    Ok(config)
}

/// Keyboard/mouse mode: events run through the control engine.
async fn run_engine(
    cli: &Cli,
    config: Config,
    mut events: mpsc::Receiver<ControllerEvent>,
    grab: &watch::Sender<bool>,
) -> Result<()> {
    let keyboard = VirtualKeyboard::new().context("Failed to create virtual keyboard")?;
    let mut engine = Engine::new(config, Box::new(keyboard));
    if let Some(name) = &cli.kill {
        engine = engine.with_process(Box::new(PkillProcess::new(name.as_str(), cli.sudo_kill)));
    }

    let clock = Instant::now();
    let now = || clock.elapsed().as_millis() as u64;

    apply_grab(&mut engine, grab);
    info!("Press Ctrl+C to exit");

    loop {
        let wait = engine
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now()));

        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        engine.handle_event(event);
                        while let Ok(event) = events.try_recv() {
                            engine.handle_event(event);
                        }
                    }
                    None => {
                        warn!("All controllers disconnected");
                        break;
                    }
                }
            }

            // Repeat or mouse motion due
            _ = sleep(Duration::from_millis(wait.unwrap_or(0))), if wait.is_some() => {}

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }

        engine.tick(now());
        apply_grab(&mut engine, grab);

        if !engine.is_running() {
            info!("Quit combo pressed, shutting down...");
            break;
        }
    }

    engine.release_all();
    if grab.send(false).is_err() {
        debug!("No controller reader left to release");
    }
    Ok(())
}

fn apply_grab(engine: &mut Engine, grab: &watch::Sender<bool>) {
    if let Some(exclusive) = engine.take_grab_request() {
        debug!("Exclusive mode {}", if exclusive { "on" } else { "off" });
        if grab.send(exclusive).is_err() {
            debug!("No controller reader left to grab");
        }
    }
}

/// Xbox 360 mode: events are forwarded unchanged.
async fn run_passthrough(mut events: mpsc::Receiver<ControllerEvent>) -> Result<()> {
    let mut gamepad = VirtualGamepad::new().context("Failed to create virtual gamepad")?;
    info!("Forwarding controller as Xbox 360 pad, press Ctrl+C to exit");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        if let Err(e) = gamepad.forward(event) {
                            debug!("Failed to forward event: {}", e);
                        }
                    }
                    None => {
                        warn!("All controllers disconnected");
                        break;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    Ok(())
}
