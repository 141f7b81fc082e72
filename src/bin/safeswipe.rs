// SafeSwipe CLI - drive the panic controller from a script or the terminal

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, warn};
use safeswipe::constants::DEFAULT_VIEWPORT;
use safeswipe::controller::{ControllerParts, PanicController};
use safeswipe::script::{self, Step};
use safeswipe::settings::SettingsPatch;
use safeswipe::store::{FileStore, MemoryStore};
use safeswipe::{config, SafeSwipeCore};
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// Gesture-triggered panic mode with decoy screens
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Gesture-triggered panic mode with decoy screens",
    long_about = "Gesture-triggered panic mode with decoy screens.

Detects a configured swipe-and-hold, long press, long-press zone or keyboard
combination and switches into panic mode: clean-up actions run (simulated) and a
decoy screen replaces the real content until the secret exit is used.

SETUP:
  Write a settings file with defaults and the default protected apps:
    safeswipe --setup

INPUT (one command per line, via --replay or stdin):
  touchstart X Y | touchmove X Y | touchend [X Y]
  key NAME | keyup NAME | zonekey N NAME | zonekeyup N NAME
  trigger | reset | exit | cancel | unlock | tap | digit | delete | dismiss
  set field=value ... | status | wait MS | at MS"
)]
struct Args {
    /// Write a default settings file and exit
    #[arg(long)]
    setup: bool,

    /// Settings file (overrides SAFESWIPE_SETTINGS and the default location)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Replay a script in logical time, then print the session
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Arm delayed panic for this many minutes at start (1-1440)
    #[arg(long)]
    delayed: Option<u32>,

    /// Screen size used to place long-press zones, as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<(f64, f64)>,
}

fn parse_viewport(raw: &str) -> Result<(f64, f64), String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", raw))?;
    let width = w.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<f64>().map_err(|e| e.to_string())?;
    if width <= 0.0 || height <= 0.0 {
        return Err("viewport must be positive".to_string());
    }
    Ok((width, height))
}

fn settings_store(args: &Args) -> Result<FileStore> {
    match args.settings.clone().or_else(config::parse_settings_path) {
        Some(path) => Ok(FileStore::new(path)),
        None => FileStore::open_default(),
    }
}

fn run_setup(store: &FileStore) -> Result<()> {
    println!("SafeSwipe Setup");
    println!("===============\n");

    if store.path().exists() {
        bail!(
            "Settings file already exists at: {}\nDelete it first to start over.",
            store.path().display()
        );
    }
    let data = store
        .create_default()
        .context("Failed to write default settings")?;

    println!("Settings saved to: {}", store.path().display());
    println!(
        "Trigger: {} swipes up, then hold for {:.1}s",
        data.settings.swipe_count,
        f64::from(data.settings.hold_duration) / 10.0
    );
    println!("Protected apps:");
    for app in &data.protected_apps {
        println!("  {} - {}", app.name, app.disguise_summary());
    }
    Ok(())
}

/// Env overrides first, then explicit flags
fn startup_patch(args: &Args) -> SettingsPatch {
    let mut patch = config::env_overrides();
    if let Some(minutes) = args.delayed {
        patch.delayed_panic_enabled = Some(true);
        patch.delayed_panic_minutes = Some(minutes);
    }
    patch
}

/// Replays run against an in-memory copy of the settings file
fn run_replay(
    store: &FileStore,
    viewport: (f64, f64),
    patch: &SettingsPatch,
    path: &Path,
) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    let steps: Vec<Step> = script::parse_script(&text)?;

    let data = store.load().context("Failed to load settings for replay")?;
    let parts = ControllerParts::new(MemoryStore::from_data(data)).viewport(viewport);
    let mut ctl = PanicController::start(parts, 0);
    if !patch.is_empty() {
        ctl.override_settings(patch, 0)
            .context("Invalid startup overrides")?;
    }
    let end = script::replay(&mut ctl, steps, 0)?;

    println!("t={} ms: {}", end, script::describe(ctl.session()));
    for notice in &ctl.session().notices {
        println!("notice at {} ms: {}", notice.at, notice.message);
    }
    Ok(())
}

fn run_interactive(parts: ControllerParts, patch: &SettingsPatch) -> Result<()> {
    let core = SafeSwipeCore::new(parts);
    if !patch.is_empty() {
        let now = core.now();
        core.controller()
            .lock()
            .override_settings(patch, now)
            .context("Invalid startup overrides")?;
    }

    let events = core.subscribe();
    core.start_background_threads()?;
    std::thread::Builder::new()
        .name("session-events".to_string())
        .spawn(move || {
            for event in events {
                info!("Session event: {:?}", event);
            }
        })
        .context("Failed to spawn session event thread")?;

    println!("SafeSwipe running. Type commands, Ctrl+D to quit.");
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let step = match script::parse_line(&line) {
            Ok(Some(step)) => step,
            Ok(None) => continue,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };
        match step {
            Step::Run(command) => {
                if let Err(e) = core.apply(command) {
                    warn!("{:#}", e);
                }
            }
            Step::Wait(_) | Step::At(_) => warn!("'wait' and 'at' only apply to --replay"),
        }
        println!("{}", script::describe(&core.session()));
    }

    core.stop();
    info!("SafeSwipe stopped");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let store = match settings_store(&args) {
        Ok(store) => store,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    if args.setup {
        return run_setup(&store);
    }

    info!("Starting SafeSwipe");
    info!("Settings file: {}", store.path().display());

    let patch = startup_patch(&args);
    let viewport = args.viewport.unwrap_or(DEFAULT_VIEWPORT);

    match &args.replay {
        Some(path) => run_replay(&store, viewport, &patch, path),
        None => run_interactive(ControllerParts::new(store).viewport(viewport), &patch),
    }
}
