//! `citywatch`: terminal dashboard for placing and monitoring cameras on a
//! city map.
//!
//! Built on [ratatui](https://ratatui.rs). Camera markers and coverage
//! circles are kept in sync with the reactive `CameraStore` by
//! `citywatch-core`'s overlay engine, drawn on a braille canvas.
//!
//! Logs are written to a file (default `/tmp/citywatch.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod canvas_surface;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use citywatch_config::Config;
use citywatch_core::CameraStore;

use crate::app::App;

/// Terminal dashboard for camera coverage on a city map.
#[derive(Parser, Debug)]
#[command(name = "citywatch", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,

    /// Log file path (defaults to /tmp/citywatch.log)
    #[arg(long, default_value = "/tmp/citywatch.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr, that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Prefix match: also covers citywatch_core and citywatch_config.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("citywatch={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("citywatch.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

fn load(cli: &Cli) -> Result<Config> {
    let cfg = match &cli.config {
        Some(path) => citywatch_config::load_config_from(path)?,
        None => citywatch_config::load_config()?,
    };
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file; hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    let cfg = load(&cli)?;

    if cli.write_config {
        let path = match &cli.config {
            Some(path) => {
                citywatch_config::save_config_to(&cfg, path)?;
                path.clone()
            }
            None => citywatch_config::save_config(&cfg)?,
        };
        println!("wrote {}", path.display());
        return Ok(());
    }

    let map_config = cfg.map_config()?;
    let store = Arc::new(CameraStore::with_cameras(cfg.seed_cameras()));
    info!(
        cameras = store.len(),
        center = %map_config.center,
        zoom = map_config.zoom,
        "starting citywatch"
    );

    let mut app = App::new(map_config, store);
    app.run().await
}
